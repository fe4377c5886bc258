//! Per-target FIFO task queue

use std::collections::VecDeque;

use contracts::Task;

/// Ordered list of pending tasks for one target
///
/// Tasks leave only from the front, in the order they were pushed.
#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: VecDeque<Task>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail
    pub fn push(&mut self, task: Task) {
        self.tasks.push_back(task);
    }

    /// Remove and return the head
    pub fn pop(&mut self) -> Option<Task> {
        self.tasks.pop_front()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Drop every pending task, returning how many were removed
    pub fn clear(&mut self) -> usize {
        let removed = self.tasks.len();
        self.tasks.clear();
        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = TaskQueue::new();
        queue.push(Task::execute_action("first"));
        queue.push(Task::press_key("enter"));
        queue.push(Task::see("result page"));
        assert_eq!(queue.len(), 3);

        assert_eq!(queue.pop(), Some(Task::execute_action("first")));
        assert_eq!(queue.pop(), Some(Task::press_key("enter")));
        assert_eq!(queue.pop(), Some(Task::see("result page")));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clear_reports_removed() {
        let mut queue = TaskQueue::new();
        queue.push(Task::press_key("a"));
        queue.push(Task::press_key("b"));
        assert_eq!(queue.clear(), 2);
        assert_eq!(queue.clear(), 0);
    }
}
