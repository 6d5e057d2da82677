use std::collections::BTreeSet;

use rstest::rstest;

use reelbench::backend::RawResult;
use reelbench::core::BackendTag;
use reelbench::normalize::normalize;
use reelbench::query::{QueryKind, ResultRow};
use reelbench::testutil::seeded_payload;

fn normalized(tag: BackendTag, kind: QueryKind) -> Vec<ResultRow> {
    let raw = RawResult {
        kind,
        payload: seeded_payload(tag, kind),
    };
    normalize(tag, raw).unwrap()
}

#[rstest]
#[case(QueryKind::TopRatedMovies)]
#[case(QueryKind::SearchMovies)]
#[case(QueryKind::TrendingMovies)]
fn test_equivalent_outputs_share_membership(#[case] kind: QueryKind) {
    let ids = |rows: Vec<ResultRow>| rows.iter().map(|r| r.entity_id).collect::<BTreeSet<_>>();
    assert_eq!(
        ids(normalized(BackendTag::Sql, kind)),
        ids(normalized(BackendTag::Nosql, kind))
    );
}

#[test]
fn test_fight_club_in_both_top_rated() {
    for tag in BackendTag::ALL {
        let rows = normalized(tag, QueryKind::TopRatedMovies);
        let fight_club = rows.iter().find(|r| r.entity_id == 550).unwrap();
        assert_eq!(fight_club.display_name, "Fight Club");
        assert_eq!(fight_club.score, 4.2);
        assert_eq!(fight_club.support_count, 1200);
    }
}

#[test]
fn test_trending_support_counts_differ_by_backend() {
    let sql = normalized(BackendTag::Sql, QueryKind::TrendingMovies);
    let nosql = normalized(BackendTag::Nosql, QueryKind::TrendingMovies);
    assert_eq!(sql[0].entity_id, nosql[0].entity_id);
    assert_eq!(sql[0].score, nosql[0].score);
    // ratings on one side, interaction events on the other
    assert_eq!(sql[0].support_count, 1200);
    assert_eq!(nosql[0].support_count, 2100);
}
