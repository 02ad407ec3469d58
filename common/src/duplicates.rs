//! 重複コード検出

use crate::types::Record;
use std::collections::HashMap;

/// コードごとの出現回数を集計（空コードは除外）
pub fn count_codes(records: &[Record]) -> HashMap<&str, usize> {
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for record in records {
        if !record.code.is_empty() {
            *counts.entry(record.code.as_str()).or_insert(0) += 1;
        }
    }

    counts
}

/// 同一バッチ内で2回以上出現するコードに重複フラグを立てる
pub fn flag_duplicates(records: &mut [Record]) {
    let duplicated: Vec<bool> = {
        let counts = count_codes(records);
        records
            .iter()
            .map(|r| !r.code.is_empty() && counts.get(r.code.as_str()).copied().unwrap_or(0) > 1)
            .collect()
    };

    for (record, is_duplicate) in records.iter_mut().zip(duplicated) {
        record.is_duplicate = is_duplicate;
    }
}
