//! Property tests for configuration, planning and continuation.

use proptest::prelude::*;

use mailledger_reader::advance::advance;
use mailledger_reader::strategy::{plan, search_cap_exceeded, slice_search_results};
use mailledger_reader::{
    Continuation, Error, IdRange, MessageId, Plan, QuerySpec, SearchQuery, SelectionMode, Take,
};

proptest! {
    #[test]
    fn negative_skip_is_rejected(n in i64::MIN..0) {
        let err = QuerySpec::new().with_skip(n).unwrap_err();
        let is_skip = matches!(err, Error::InvalidArgument { name: "skip", .. });
        prop_assert!(is_skip);
    }

    #[test]
    fn take_below_minus_one_is_rejected(n in i64::MIN..-1) {
        prop_assert!(QuerySpec::new().with_take(n, false).is_err());
    }

    #[test]
    fn valid_take_is_accepted(n in -1i64..=i64::from(u32::MAX)) {
        let spec = QuerySpec::new().with_take(n, true).unwrap();
        let expected = if n == -1 { Take::All } else { Take::Count(u32::try_from(n).unwrap()) };
        prop_assert_eq!(spec.take(), expected);
    }

    #[test]
    fn search_slice_never_exceeds_cap(
        candidates in prop::collection::vec(1u32..5000, 0..600),
        skip in 0u32..400,
        take in prop_oneof![Just(Take::All), (0u32..600).prop_map(Take::Count)],
        cap in 1u32..300,
    ) {
        let candidates: Vec<MessageId> = candidates.into_iter().map(MessageId::new).collect();
        let window = slice_search_results(candidates, skip, take, cap);
        prop_assert!(window.len() <= cap as usize);
        prop_assert!(window.windows(2).all(|w| w[0] < w[1]));
        if let Take::Count(n) = take {
            prop_assert!(window.len() <= n as usize);
        }
    }

    #[test]
    fn search_cap_warning_iff_sum_exceeds(skip in 0u32..1000, n in 0u32..1000) {
        prop_assert_eq!(search_cap_exceeded(skip, Take::Count(n), 250), skip + n > 250);
    }

    #[test]
    fn id_range_advance_moves_forward(start in 0u32..u32::MAX, size in 0u32..100_000) {
        let spec = QuerySpec::new().with_batch(MessageId::new(start), size, true);
        let range = spec.id_range().unwrap();
        match advance(spec, SelectionMode::IdRange, 1, 0) {
            Continuation::Next(next) => {
                let next_range = next.id_range().unwrap();
                prop_assert_eq!(next_range.start().get(), range.end().get() + 1);
                prop_assert!(!next_range.is_inverted());
                prop_assert!(next_range.start() > range.end());
            }
            Continuation::Exhausted(next) => {
                prop_assert!(range.end().is_max());
                prop_assert!(!next.is_continuous());
            }
            Continuation::Stopped(_) => prop_assert!(false, "continuous spec reported stopped"),
        }
    }

    #[test]
    fn index_windows_stay_inside_folder(
        count in 0u32..500,
        skip in 0i64..600,
        take in 1i64..100,
    ) {
        let spec = QuerySpec::new().with_skip(skip).unwrap().with_take(take, true).unwrap();
        match plan(spec, count, 250).plan {
            Plan::Indices(range) => {
                prop_assert!(range.end() < count);
                prop_assert!(range.len() <= u64::try_from(take).unwrap());
            }
            Plan::Empty => prop_assert!(u32::try_from(skip).unwrap() >= count),
            other => prop_assert!(false, "unexpected plan {:?}", other),
        }
    }

    #[test]
    fn search_queries_select_search_mode(skip in 0i64..1000) {
        let spec = QuerySpec::new()
            .with_skip(skip)
            .unwrap()
            .with_top(5)
            .unwrap()
            .with_query(SearchQuery::Unseen, 250);
        prop_assert_eq!(spec.selection().mode(), SelectionMode::Search);
        let range = IdRange::new(MessageId::new(1), MessageId::new(2));
        prop_assert_eq!(spec.with_range(range, false).selection().mode(), SelectionMode::IdRange);
    }
}
