// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2022 Adrian <adrian.eddy at gmail>

use std::collections::BTreeMap;

pub trait MapClosest<V> {
    fn get_closest(&self, key: &i64, max_diff: i64) -> Option<&V>;
}
impl<V> MapClosest<V> for BTreeMap<i64, V> {
    /// Entry with the nearest key at most `max_diff` away. Ties go to the lower key.
    fn get_closest(&self, key: &i64, max_diff: i64) -> Option<&V> {
        if let Some(v) = self.get(key) { return Some(v); }

        let f = self.range(..key).next_back();
        let b = self.range(key..).next();
        let fd = f.map(|v| key - *v.0);
        let bd = b.map(|v| *v.0 - key);

        match (f, fd, b, bd) {
            (Some(f), Some(fd), _, bd) if fd <= max_diff && bd.map_or(true, |bd| fd <= bd) => Some(f.1),
            (_, _, Some(b), Some(bd)) if bd <= max_diff => Some(b.1),
            _ => None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_key() {
        let map: BTreeMap<i64, &str> = [(10, "a"), (20, "b")].into_iter().collect();
        assert_eq!(map.get_closest(&10, 0), Some(&"a"));
        assert_eq!(map.get_closest(&14, 5), Some(&"a"));
        assert_eq!(map.get_closest(&15, 5), Some(&"a"));
        assert_eq!(map.get_closest(&16, 5), Some(&"b"));
        assert_eq!(map.get_closest(&26, 5), None);
        assert_eq!(map.get_closest(&3, 5), None);
        assert_eq!(BTreeMap::<i64, ()>::new().get_closest(&0, 100), None);
    }
}
