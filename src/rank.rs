use serde::Serialize;

use crate::spotify::Track;

/// Tracks ordered by popularity, most popular first.
///
/// Equal popularities keep the order the provider returned them in, so a
/// track's rank is simply its 1-based position.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct RankedCollection(Vec<Track>);

/// Where a focal track sits inside a collection. `position` is `None` when
/// the track is not part of the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rank {
    pub position: Option<usize>,
    pub total: usize,
}

impl RankedCollection {
    pub fn new(mut tracks: Vec<Track>) -> Self {
        // sort_by is stable
        tracks.sort_by(|a, b| b.popularity.cmp(&a.popularity));
        Self(tracks)
    }

    /// Ranks `tracks` and keeps only the `limit` most popular.
    pub fn top(tracks: Vec<Track>, limit: usize) -> Self {
        let mut ranked = Self::new(tracks);
        ranked.0.truncate(limit);
        ranked
    }

    pub fn rank_of(&self, focal_id: &str) -> Rank {
        rank(self, focal_id)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub fn rank(collection: &RankedCollection, focal_id: &str) -> Rank {
    Rank {
        position: collection
            .tracks()
            .iter()
            .position(|t| t.id == focal_id)
            .map(|index| index + 1),
        total: collection.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(collection: &RankedCollection) -> Vec<&str> {
        collection.tracks().iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_three_track_album() {
        let collection = RankedCollection::new(vec![
            Track::mock("a", "x", 40),
            Track::mock("b", "x", 90),
            Track::mock("c", "x", 60),
        ]);

        let popularities: Vec<u8> = collection.tracks().iter().map(|t| t.popularity).collect();
        assert_eq!(popularities, vec![90, 60, 40]);
        assert_eq!(
            collection.rank_of("c"),
            Rank {
                position: Some(2),
                total: 3
            }
        );
    }

    #[test]
    fn test_ties_keep_provider_order() {
        let collection = RankedCollection::new(vec![
            Track::mock("first", "x", 50),
            Track::mock("top", "x", 70),
            Track::mock("second", "x", 50),
            Track::mock("third", "x", 50),
        ]);
        assert_eq!(ids(&collection), vec!["top", "first", "second", "third"]);
    }

    #[test]
    fn test_missing_focal_track() {
        let collection = RankedCollection::new(vec![Track::mock("a", "x", 1)]);
        assert_eq!(
            rank(&collection, "zzz"),
            Rank {
                position: None,
                total: 1
            }
        );
        assert_eq!(rank(&RankedCollection::default(), "a").total, 0);
    }

    #[test]
    fn test_rank_is_consistent_with_popularity() {
        let popularities = [3u8, 99, 0, 42, 42, 17, 100, 64, 8, 42, 77, 1];
        let collection = RankedCollection::new(
            popularities
                .iter()
                .enumerate()
                .map(|(i, p)| Track::mock(&format!("t{}", i), "x", *p))
                .collect(),
        );

        for a in collection.tracks() {
            for b in collection.tracks() {
                if a.popularity > b.popularity {
                    let rank_a = collection.rank_of(&a.id).position.unwrap();
                    let rank_b = collection.rank_of(&b.id).position.unwrap();
                    assert!(rank_a < rank_b, "{} should outrank {}", a.id, b.id);
                }
            }
        }
    }

    #[test]
    fn test_top_truncates_after_sorting() {
        let collection = RankedCollection::top(
            vec![
                Track::mock("low", "x", 1),
                Track::mock("high", "x", 99),
                Track::mock("mid", "x", 50),
            ],
            2,
        );
        assert_eq!(ids(&collection), vec!["high", "mid"]);
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let collection = RankedCollection::new(vec![Track::mock("a", "x", 1)]);
        let json = serde_json::to_value(&collection).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["id"], "a");
    }
}
