/// 检测结果结构
///
/// 缓冲区坐标下的一个圆形目标中心。创建后不再修改，抑制阶段只做筛选。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// 中心x坐标
    pub x: u32,
    /// 中心y坐标
    pub y: u32,
    /// 半径，同一次检测中所有结果相同
    pub radius: u32,
    /// 置信度，圆周上被判为边缘的采样点比例
    pub confidence: f32,
}

impl Detection {
    pub fn new(x: u32, y: u32, radius: u32, confidence: f32) -> Self {
        Self { x, y, radius, confidence }
    }

    /// 两个中心之间的欧氏距离
    pub fn distance(&self, other: &Detection) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        (dx * dx + dy * dy).sqrt()
    }

    /// 两个检测是否重叠（中心距离小于两倍半径）
    pub fn overlaps(&self, other: &Detection) -> bool {
        self.distance(other) < 2.0 * self.radius as f64
    }
}

/// 显示坐标下的检测结果，供叠加层绘制
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayDetection {
    pub cx: f32,
    pub cy: f32,
    pub r: f32,
}

/// 有序的检测结果集合
///
/// 保持扫描顺序（自上而下、自左而右）。与定长容器不同，这里的容量随帧大小变化，
/// 候选数量上限约为 (W/step)·(H/step)。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionSet {
    detections: Vec<Detection>,
}

impl DetectionSet {
    /// 创建一个新的空集合
    pub fn new() -> Self {
        Self { detections: Vec::new() }
    }

    pub fn push(&mut self, detection: Detection) {
        self.detections.push(detection);
    }

    pub fn clear(&mut self) {
        self.detections.clear();
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn as_slice(&self) -> &[Detection] {
        &self.detections
    }

    pub fn get(&self, index: usize) -> Option<&Detection> {
        self.detections.get(index)
    }

    pub fn first(&self) -> Option<&Detection> {
        self.detections.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Detection> {
        self.detections.iter()
    }

    /// 当前集合中是否有与 `candidate` 重叠的结果
    pub fn any_overlapping(&self, candidate: &Detection) -> bool {
        self.detections.iter().any(|kept| candidate.overlaps(kept))
    }
}

impl From<Vec<Detection>> for DetectionSet {
    fn from(detections: Vec<Detection>) -> Self {
        Self { detections }
    }
}

impl FromIterator<Detection> for DetectionSet {
    fn from_iter<I: IntoIterator<Item = Detection>>(iter: I) -> Self {
        Self { detections: iter.into_iter().collect() }
    }
}

impl<'a> IntoIterator for &'a DetectionSet {
    type Item = &'a Detection;
    type IntoIter = std::slice::Iter<'a, Detection>;

    fn into_iter(self) -> Self::IntoIter {
        self.detections.iter()
    }
}

impl IntoIterator for DetectionSet {
    type Item = Detection;
    type IntoIter = std::vec::IntoIter<Detection>;

    fn into_iter(self) -> Self::IntoIter {
        self.detections.into_iter()
    }
}
