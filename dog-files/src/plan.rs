use std::path::PathBuf;

use crate::UploadRules;

/// How a file is split into parts for one upload call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPlan {
    pub file_path: PathBuf,
    pub file_name: String,
    pub mime_type: String,
    pub total_size_bytes: u64,
    pub part_count: u32,
}

/// Byte range of a single part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartRange {
    /// 1-based
    pub part_number: u32,
    pub offset: u64,
    pub length: u64,
}

impl PartRange {
    /// Exclusive end offset
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

/// Number of parts for a file of `size` bytes.
///
/// A requested count wins over the chunk-size estimate; both are clamped to
/// `1..=rules.max_parts`, and empty files always use a single part.
pub fn part_count_for(size: u64, requested: Option<u32>, rules: &UploadRules) -> u32 {
    if size == 0 {
        return 1;
    }

    let max_parts = rules.max_parts.max(1);
    let count = match requested {
        Some(parts) => u64::from(parts),
        None => size.div_ceil(rules.chunk_size.max(1)),
    };

    count.clamp(1, u64::from(max_parts)) as u32
}

impl UploadPlan {
    pub fn new(
        file_path: PathBuf,
        file_name: String,
        mime_type: String,
        total_size_bytes: u64,
        requested_parts: Option<u32>,
        rules: &UploadRules,
    ) -> Self {
        let part_count = part_count_for(total_size_bytes, requested_parts, rules);
        Self {
            file_path,
            file_name,
            mime_type,
            total_size_bytes,
            part_count,
        }
    }

    /// Bytes per part; the last part is clipped to the remaining tail
    pub fn part_size(&self) -> u64 {
        self.total_size_bytes.div_ceil(u64::from(self.part_count.max(1)))
    }

    /// Contiguous, non-overlapping ranges covering `[0, total_size_bytes)`
    pub fn part_ranges(&self) -> Vec<PartRange> {
        let size = self.total_size_bytes;
        let chunk = self.part_size();

        (0..self.part_count)
            .map(|index| {
                let offset = (u64::from(index) * chunk).min(size);
                let end = (offset + chunk).min(size);
                PartRange {
                    part_number: index + 1,
                    offset,
                    length: end - offset,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    fn plan(size: u64, requested: Option<u32>) -> UploadPlan {
        UploadPlan::new(
            PathBuf::from("/tmp/file.bin"),
            "file.bin".to_string(),
            "application/octet-stream".to_string(),
            size,
            requested,
            &UploadRules::default(),
        )
    }

    fn assert_partitions(plan: &UploadPlan) {
        let ranges = plan.part_ranges();
        assert_eq!(ranges.len() as u32, plan.part_count);

        let mut cursor = 0;
        for (index, range) in ranges.iter().enumerate() {
            assert_eq!(range.part_number as usize, index + 1);
            assert_eq!(range.offset, cursor, "gap or overlap before part {}", range.part_number);
            cursor = range.end();
        }
        assert_eq!(cursor, plan.total_size_bytes);
        assert_eq!(ranges.iter().map(|r| r.length).sum::<u64>(), plan.total_size_bytes);
    }

    #[test]
    fn default_chunking_uses_five_mib_parts() {
        assert_eq!(plan(12 * MIB, None).part_count, 3);
        assert_eq!(plan(5 * MIB, None).part_count, 1);
        assert_eq!(plan(5 * MIB + 1, None).part_count, 2);
        assert_eq!(plan(1, None).part_count, 1);
    }

    #[test]
    fn part_count_is_capped_at_api_limit() {
        assert_eq!(plan(600 * MIB, None).part_count, 100);
        assert_eq!(plan(10 * MIB, Some(250)).part_count, 100);
        assert_eq!(plan(10 * MIB, Some(0)).part_count, 1);
    }

    #[test]
    fn zero_byte_file_has_one_empty_part() {
        let plan = plan(0, Some(7));
        assert_eq!(plan.part_count, 1);
        assert_eq!(
            plan.part_ranges(),
            vec![PartRange { part_number: 1, offset: 0, length: 0 }]
        );
    }

    #[test]
    fn last_part_is_clipped_to_tail() {
        let ranges = plan(10, Some(3)).part_ranges();
        assert_eq!(
            ranges.iter().map(|r| (r.offset, r.length)).collect::<Vec<_>>(),
            vec![(0, 4), (4, 4), (8, 2)]
        );
    }

    #[test]
    fn ranges_partition_file_for_any_requested_count() {
        let sizes = [1, 2, 3, 7, 99, 100, 101, 4096, 5 * MIB - 1, 12 * MIB + 17];
        for size in sizes {
            for parts in 1..=100 {
                assert_partitions(&plan(size, Some(parts)));
            }
            assert_partitions(&plan(size, None));
        }
    }
}
