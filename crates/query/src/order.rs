// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generic multi-key ordering (§4.1): a list of signed column names, applied
//! in order, with a stable sort so ties fall back to the vector's incoming
//! order (callers pre-sort by the collection's default key, e.g. `id`).

use std::cmp::Ordering;

use jobctl_core::OrderKey;

/// Sort `items` by `keys` in sequence, using `field_cmp` to compare two items
/// on a single named field. Unknown field names are skipped (treated as
/// equal) rather than rejected — the bulk mutation/query layer is
/// responsible for validating `order_by` strings before they reach here if
/// strict rejection is desired.
pub fn sort_by_keys<T>(items: &mut [T], keys: &[OrderKey], field_cmp: impl Fn(&str, &T, &T) -> Option<Ordering>) {
    items.sort_by(|a, b| {
        for key in keys {
            if let Some(ord) = field_cmp(&key.field, a, b) {
                let ord = if key.descending { ord.reverse() } else { ord };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
        Ordering::Equal
    });
}

/// Parse a list of raw `order_by` strings (e.g. `["-wall_time_min", "id"]`)
/// into [`OrderKey`]s.
pub fn parse_order_by(raw: &[String]) -> Vec<OrderKey> {
    raw.iter().map(|s| OrderKey::parse(s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descending_key_reverses_comparison() {
        let mut items = vec![1, 3, 2];
        let keys = vec![OrderKey {
            field: "value".into(),
            descending: true,
        }];
        sort_by_keys(&mut items, &keys, |field, a, b| {
            (field == "value").then(|| a.cmp(b))
        });
        assert_eq!(items, vec![3, 2, 1]);
    }

    #[test]
    fn unknown_field_is_a_no_op() {
        let mut items = vec![1, 2, 3];
        let keys = vec![OrderKey {
            field: "bogus".into(),
            descending: false,
        }];
        sort_by_keys(&mut items, &keys, |_, _, _| None);
        assert_eq!(items, vec![1, 2, 3]);
    }
}
