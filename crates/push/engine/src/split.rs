//! Batch splitting.

/// Group size for `devices` tokens over `senders` workers: `devices / senders + 1`.
///
/// This bounds the number of groups per request by the pool size. It does
/// not account for other requests already in flight.
pub fn group_size(devices: usize, senders: usize) -> usize {
    devices / senders.max(1) + 1
}

/// Partition tokens into consecutive groups, at most one per sender.
pub fn split_devices(devices: &[String], senders: usize) -> Vec<Vec<String>> {
    devices
        .chunks(group_size(devices.len(), senders))
        .map(<[String]>::to_vec)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn tokens(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("token-{i}")).collect()
    }

    #[test]
    fn test_five_tokens_two_senders() {
        let groups = split_devices(&tokens(5), 2);
        let sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 2]);
    }

    #[test]
    fn test_fewer_tokens_than_senders() {
        let groups = split_devices(&tokens(3), 8);
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.len() == 1));
    }

    #[test]
    fn test_partition_properties() {
        for senders in 1..=12 {
            for n in 1..=64 {
                let input = tokens(n);
                let groups = split_devices(&input, senders);

                assert!(groups.len() <= senders, "n={n} senders={senders}");
                assert_eq!(groups.iter().map(Vec::len).sum::<usize>(), n);

                let mut seen = HashSet::new();
                for token in groups.iter().flatten() {
                    assert!(seen.insert(token.clone()), "duplicate {token}");
                }

                // Consecutive chunks preserve input order.
                let flat: Vec<String> = groups.into_iter().flatten().collect();
                assert_eq!(flat, input);
            }
        }
    }

    #[test]
    fn test_zero_senders_treated_as_one() {
        assert_eq!(group_size(4, 0), 5);
        assert_eq!(split_devices(&tokens(4), 0).len(), 1);
    }
}
