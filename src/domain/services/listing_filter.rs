//! Listing Filter Service
//!
//! Pure domain logic for narrowing a listing collection to the
//! requester's country. This service has NO external dependencies.

use crate::domain::entities::Listing;

/// Country filter over a listing collection.
///
/// Matching is an exact, case-sensitive comparison between the resolved
/// country name and `address.country`. No normalization is applied, so a
/// store that spells countries differently from the lookup database will
/// under-match.
pub struct ListingFilter;

impl ListingFilter {
    /// Keep the listings located in `country`.
    ///
    /// # Arguments
    /// * `listings` - Collection in store order
    /// * `country` - Resolved country, or None when geolocation failed
    ///
    /// # Returns
    /// The input unchanged when `country` is None, otherwise the ordered
    /// subsequence whose `address.country` equals `country`. Listings
    /// without a country are dropped while a filter is active.
    pub fn by_country(listings: Vec<Listing>, country: Option<&str>) -> Vec<Listing> {
        let Some(country) = country else {
            return listings;
        };

        listings
            .into_iter()
            .filter(|listing| Self::matches(listing, country))
            .collect()
    }

    /// Whether a single listing belongs to `country`.
    pub fn matches(listing: &Listing, country: &str) -> bool {
        listing.country() == Some(country)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn listing(id: &str, country: Option<&str>) -> Listing {
        let value = match country {
            Some(c) => json!({"_id": id, "address": {"country": c}}),
            None => json!({"_id": id, "address": {"street": "unknown"}}),
        };
        Listing::from_value(value).unwrap()
    }

    fn ids(listings: &[Listing]) -> Vec<String> {
        listings.iter().filter_map(|l| l.id()).collect()
    }

    fn sample() -> Vec<Listing> {
        vec![
            listing("1", Some("Hong Kong")),
            listing("2", Some("United States")),
            listing("3", None),
            listing("4", Some("Hong Kong")),
            listing("5", Some("Portugal")),
        ]
    }

    #[test]
    fn test_none_returns_input_unchanged() {
        let input = sample();
        let out = ListingFilter::by_country(input.clone(), None);
        assert_eq!(out, input);
    }

    #[test]
    fn test_filters_and_preserves_order() {
        let out = ListingFilter::by_country(sample(), Some("Hong Kong"));
        assert_eq!(ids(&out), vec!["1", "4"]);
    }

    #[test]
    fn test_listing_without_country_excluded() {
        let out = ListingFilter::by_country(sample(), Some("United States"));
        assert_eq!(ids(&out), vec!["2"]);
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let out = ListingFilter::by_country(sample(), Some("hong kong"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_unknown_country_yields_empty() {
        let out = ListingFilter::by_country(sample(), Some("Atlantis"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(ListingFilter::by_country(Vec::new(), Some("Spain")).is_empty());
        assert!(ListingFilter::by_country(Vec::new(), None).is_empty());
    }

    #[test]
    fn test_non_string_country_never_matches() {
        let odd = Listing::from_value(json!({"_id": "9", "address": {"country": 1}})).unwrap();
        assert!(!ListingFilter::matches(&odd, "1"));
    }

    fn arb_listings() -> impl Strategy<Value = Vec<Listing>> {
        let country = prop::option::of(prop::sample::select(vec![
            "Hong Kong",
            "United States",
            "Brazil",
            "Spain",
        ]));
        prop::collection::vec(country, 0..40).prop_map(|countries| {
            countries
                .into_iter()
                .enumerate()
                .map(|(i, c)| listing(&i.to_string(), c))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_filter_is_exact_ordered_subsequence(
            input in arb_listings(),
            country in prop::sample::select(vec!["Hong Kong", "United States", "Brazil", "Mars"]),
        ) {
            let out = ListingFilter::by_country(input.clone(), Some(country));

            let expected: Vec<Listing> = input
                .iter()
                .filter(|l| l.country() == Some(country))
                .cloned()
                .collect();
            prop_assert_eq!(&out, &expected);
            prop_assert!(out.iter().all(|l| l.country() == Some(country)));
        }

        #[test]
        fn prop_none_is_identity(input in arb_listings()) {
            prop_assert_eq!(ListingFilter::by_country(input.clone(), None), input);
        }
    }
}
