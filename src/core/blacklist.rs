use std::collections::HashSet;

/// 已成功 bump 的訂單編號；只增不減，程序結束即清空
///
/// Not synchronized. The fulfillment loop owns it and processes one order at a time.
#[derive(Debug, Default)]
pub struct BlacklistRegistry {
    order_ids: HashSet<String>,
}

impl BlacklistRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, order_id: &str) -> bool {
        self.order_ids.contains(order_id)
    }

    pub fn add(&mut self, order_id: impl Into<String>) {
        self.order_ids.insert(order_id.into());
    }

    pub fn len(&self) -> usize {
        self.order_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_contains() {
        let mut blacklist = BlacklistRegistry::new();
        assert!(blacklist.is_empty());
        assert!(!blacklist.contains("1"));

        blacklist.add("1");
        blacklist.add("1");

        assert!(blacklist.contains("1"));
        assert!(!blacklist.contains("2"));
        assert_eq!(blacklist.len(), 1);
    }
}
