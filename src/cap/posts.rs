use crate::cap::bounds::{Detection, DetectionSet};

/// 去除重叠的候选结果
///
/// 按给定顺序（即扫描顺序）贪心筛选：候选中心与所有已保留结果的距离都不小于
/// `2 * radius` 时保留，否则丢弃。先出现者优先，置信度不参与裁决，
/// 因此扫描顺序靠前的低置信度结果可以压掉靠后的高置信度结果。
///
/// 复杂度为 O(n²)，n 受网格采样限制，约为 (W/step)·(H/step)。
///
/// # 参数
/// * `candidates` - 检测器输出的候选结果
///
/// # 返回值
/// 两两不重叠的结果集合，保持原有相对顺序
///
/// # 示例
///
/// ```
/// use capscan::{Detection, suppress};
///
/// let kept = suppress(&[
///     Detection::new(95, 95, 15, 0.625),
///     Detection::new(105, 95, 15, 1.0),
/// ]);
/// assert_eq!(kept.len(), 1);
/// assert_eq!(kept.as_slice()[0].confidence, 0.625);
/// ```
pub fn suppress(candidates: &[Detection]) -> DetectionSet {
    let mut kept = DetectionSet::new();
    for candidate in candidates {
        if !kept.any_overlapping(candidate) {
            kept.push(*candidate);
        }
    }
    kept
}
