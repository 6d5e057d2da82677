use crate::conf::QueryConfig;
use crate::query::{Filters, QueryDescriptor, QueryKind};

#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Int(i64),
    Float(f64),
    Text(String),
}

/// SQL text with positional (`$n`) bind parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub text: String,
    pub params: Vec<SqlParam>,
}

#[derive(Default)]
struct Binds(Vec<SqlParam>);

impl Binds {
    fn push(&mut self, param: SqlParam) -> String {
        self.0.push(param);
        format!("${}", self.0.len())
    }
}

/// Escapes LIKE metacharacters so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn filter_clauses(filters: &Filters, binds: &mut Binds) -> Vec<String> {
    let mut clauses = Vec::new();
    if let Some(title) = &filters.title_substring {
        let p = binds.push(SqlParam::Text(escape_like(title)));
        clauses.push(format!(r"m.title ILIKE '%' || {p} || '%' ESCAPE '\'"));
    }
    if let Some(genre) = &filters.genre {
        let p = binds.push(SqlParam::Text(genre.clone()));
        clauses.push(format!(
            "EXISTS (SELECT 1 FROM movie_genres mg JOIN genres g ON g.genre_id = mg.genre_id \
             WHERE mg.movie_id = m.movie_id AND LOWER(g.genre_name) = LOWER({p}))"
        ));
    }
    if let Some(from) = filters.year_from {
        let p = binds.push(SqlParam::Int(from as i64));
        clauses.push(format!("EXTRACT(YEAR FROM m.released_date) >= {p}"));
    }
    if let Some(to) = filters.year_to {
        let p = binds.push(SqlParam::Int(to as i64));
        clauses.push(format!("EXTRACT(YEAR FROM m.released_date) <= {p}"));
    }
    clauses
}

fn window_clause(days: Option<u32>, binds: &mut Binds) -> Option<String> {
    days.map(|days| {
        let p = binds.push(SqlParam::Int(days as i64));
        format!("r.timestamp >= CURRENT_TIMESTAMP - make_interval(days => {p}::int)")
    })
}

fn where_sql(clauses: &[String]) -> String {
    if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    }
}

/// Translates a descriptor into parameterized SQL against the `movies`,
/// `ratings`, `movie_genres` and `genres` tables.
pub fn build(descriptor: &QueryDescriptor, settings: &QueryConfig) -> SqlQuery {
    let mut binds = Binds::default();
    let text = match descriptor.kind() {
        QueryKind::TopRatedMovies => {
            let mut clauses: Vec<String> =
                window_clause(descriptor.time_window_days(), &mut binds)
                    .into_iter()
                    .collect();
            clauses.extend(filter_clauses(descriptor.filters(), &mut binds));
            let min_support = binds.push(SqlParam::Int(settings.min_support as i64));
            let limit = binds.push(SqlParam::Int(descriptor.limit() as i64));
            format!(
                "SELECT m.movie_id, m.title, \
                 AVG(r.rating)::float8 AS avg_rating, COUNT(r.rating_id) AS rating_count \
                 FROM movies m JOIN ratings r ON r.movie_id = m.movie_id \
                 {where_sql} \
                 GROUP BY m.movie_id, m.title \
                 HAVING COUNT(r.rating_id) >= {min_support} \
                 ORDER BY avg_rating DESC, rating_count DESC, m.movie_id ASC \
                 LIMIT {limit}",
                where_sql = where_sql(&clauses),
            )
        }
        QueryKind::TrendingMovies => {
            let decay = binds.push(SqlParam::Float(settings.trending_decay));
            let mut clauses: Vec<String> =
                window_clause(descriptor.time_window_days(), &mut binds)
                    .into_iter()
                    .collect();
            clauses.extend(filter_clauses(descriptor.filters(), &mut binds));
            let limit = binds.push(SqlParam::Int(descriptor.limit() as i64));
            format!(
                "SELECT m.movie_id, m.title, \
                 SUM(r.rating * EXP(-{decay}::float8 * \
                 EXTRACT(EPOCH FROM (CURRENT_TIMESTAMP - r.timestamp)) / 86400.0))::float8 \
                 AS trending_score, \
                 COUNT(r.rating_id) AS total_ratings \
                 FROM movies m JOIN ratings r ON r.movie_id = m.movie_id \
                 {where_sql} \
                 GROUP BY m.movie_id, m.title \
                 ORDER BY trending_score DESC, m.movie_id ASC \
                 LIMIT {limit}",
                where_sql = where_sql(&clauses),
            )
        }
        QueryKind::SearchMovies => {
            // The window only narrows which ratings are counted, not which
            // movies match.
            let join_window = window_clause(descriptor.time_window_days(), &mut binds)
                .map(|clause| format!(" AND {clause}"))
                .unwrap_or_default();
            let clauses = filter_clauses(descriptor.filters(), &mut binds);
            let limit = binds.push(SqlParam::Int(descriptor.limit() as i64));
            format!(
                "SELECT m.movie_id, m.title, \
                 COALESCE(m.popularity, 0)::float8 AS popularity, \
                 COUNT(r.rating_id) AS rating_count \
                 FROM movies m LEFT JOIN ratings r ON r.movie_id = m.movie_id{join_window} \
                 {where_sql} \
                 GROUP BY m.movie_id, m.title, m.popularity \
                 ORDER BY popularity DESC, m.movie_id ASC \
                 LIMIT {limit}",
                where_sql = where_sql(&clauses),
            )
        }
    };
    SqlQuery {
        text,
        params: binds.0,
    }
}
