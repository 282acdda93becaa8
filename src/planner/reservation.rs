//! Run-scoped target reservations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Outcome of a reservation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reservation {
    /// The target is now held by the caller's source
    Reserved,
    /// The target is held by an earlier source
    Taken(PathBuf),
}

/// Target path -> first source that claimed it.
///
/// Owned by one planning pass. `reserve` checks and inserts in a single
/// `&mut self` call, so a target has exactly one holder.
#[derive(Debug, Default)]
pub struct ReservationMap {
    claims: HashMap<PathBuf, PathBuf>,
}

impl ReservationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `target` for `source` unless an earlier source holds it
    pub fn reserve(&mut self, target: &Path, source: &Path) -> Reservation {
        match self.claims.get(target) {
            Some(holder) => Reservation::Taken(holder.clone()),
            None => {
                self.claims.insert(target.to_path_buf(), source.to_path_buf());
                Reservation::Reserved
            }
        }
    }

    pub fn holder(&self, target: &Path) -> Option<&Path> {
        self.claims.get(target).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_claim_wins() {
        let mut map = ReservationMap::new();
        let target = Path::new("/out/A.cbz");

        assert_eq!(map.reserve(target, Path::new("/in/a.cbz")), Reservation::Reserved);
        assert_eq!(
            map.reserve(target, Path::new("/in/b.cbz")),
            Reservation::Taken(PathBuf::from("/in/a.cbz"))
        );
        assert_eq!(
            map.reserve(target, Path::new("/in/c.cbz")),
            Reservation::Taken(PathBuf::from("/in/a.cbz"))
        );
        assert_eq!(map.holder(target), Some(Path::new("/in/a.cbz")));
        assert_eq!(map.len(), 1);
    }
}
