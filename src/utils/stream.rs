use crate::config::STREAM_CAPACITY;
use std::collections::VecDeque;

/// 定长先进先出队列
///
/// 写满后拒绝新数据并把它交还给调用方，读空返回 None。
pub struct Stream<T> {
    pool: VecDeque<T>,
    capacity: usize,
}

impl<T> Stream<T> {
    pub fn new() -> Self {
        Self::with_capacity(STREAM_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pool: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn write(&mut self, item: T) -> Result<(), T> {
        if self.pool.len() >= self.capacity {
            return Err(item); // 缓冲区已满
        }
        self.pool.push_back(item);
        Ok(())
    }

    pub fn read(&mut self) -> Option<T> {
        self.pool.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn clear(&mut self) {
        self.pool.clear();
    }
}

impl<T> Default for Stream<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_and_capacity() {
        let mut stream = Stream::with_capacity(2);
        assert_eq!(stream.write(1), Ok(()));
        assert_eq!(stream.write(2), Ok(()));
        assert_eq!(stream.write(3), Err(3));
        assert_eq!(stream.read(), Some(1));
        assert_eq!(stream.write(4), Ok(()));
        assert_eq!(stream.read(), Some(2));
        assert_eq!(stream.read(), Some(4));
        assert_eq!(stream.read(), None);
    }

    #[test]
    fn test_default_capacity() {
        let mut stream = Stream::new();
        for i in 0..STREAM_CAPACITY {
            assert!(stream.write(i).is_ok());
        }
        assert!(stream.write(0).is_err());
        stream.clear();
        assert!(stream.is_empty());
    }
}
