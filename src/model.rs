/// Снимок счётчиков пула. Значения читаются без общей блокировки,
/// поэтому между полями возможен небольшой рассинхрон.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolMetrics {
    pub threads: usize,
    pub active_tasks: usize,
    pub queued_tasks: usize,
    pub total_submitted: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
}

impl PoolMetrics {
    pub fn utilization(&self) -> f64 {
        if self.threads == 0 {
            return 0.0;
        }
        self.active_tasks as f64 / self.threads as f64
    }

    pub fn queue_pressure(&self) -> f64 {
        if self.threads == 0 {
            return 0.0;
        }
        self.queued_tasks as f64 / self.threads as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.completed_tasks + self.failed_tasks;
        if total == 0 {
            return 1.0;
        }
        self.completed_tasks as f64 / total as f64
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOrdering {
    Ordered,
    UnOrdered,
}
