// ==========================================
// 洪灾物资调度系统 - 需求告警排序
// ==========================================
// 职责: 对全部待处理需求做告警排序
// 排序键:
// 1) 优先级 (Critical > High > Medium > Low > 未标注)
// 2) request_date 升序（等得越久越靠前）
// 3) demand_id 升序
// ==========================================
// 注意: 仅用于展示，不影响扫码核销的选单顺序
// ==========================================

use crate::domain::demand::DemandView;
use std::cmp::Ordering;

// ==========================================
// DemandRanker - 告警排序器
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct DemandRanker;

impl DemandRanker {
    pub fn new() -> Self {
        Self
    }

    /// 排序需求列表
    ///
    /// # 参数
    /// - `demands`: 待排序的需求（通常为全部 Pending）
    ///
    /// # 返回
    /// 排序后的列表（告警优先级从高到低）
    pub fn rank(&self, mut demands: Vec<DemandView>) -> Vec<DemandView> {
        demands.sort_by(|a, b| self.compare(a, b));
        demands
    }

    /// 比较两条需求的告警顺序
    pub fn compare(&self, a: &DemandView, b: &DemandView) -> Ordering {
        let (a, b) = (&a.demand, &b.demand);
        a.priority
            .rank()
            .cmp(&b.priority.rank())
            .then_with(|| a.request_date.cmp(&b.request_date))
            .then_with(|| a.demand_id.cmp(&b.demand_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::demand::Demand;
    use crate::domain::types::{DemandStatus, Priority};
    use chrono::NaiveDate;

    fn view(id: i64, priority: Priority, h: u32) -> DemandView {
        DemandView {
            demand: Demand {
                demand_id: id,
                center_id: 1,
                item_id: 1,
                quantity: 1,
                priority,
                request_date: NaiveDate::from_ymd_opt(2024, 12, 1)
                    .unwrap()
                    .and_hms_opt(h, 0, 0)
                    .unwrap(),
                status: DemandStatus::Pending,
            },
            center_name: None,
            item_name: None,
        }
    }

    fn ids(views: &[DemandView]) -> Vec<i64> {
        views.iter().map(|v| v.demand.demand_id).collect()
    }

    #[test]
    fn test_priority_then_age() {
        let ranked = DemandRanker::new().rank(vec![
            view(1, Priority::High, 10),
            view(2, Priority::Critical, 11),
            view(3, Priority::High, 9),
        ]);
        assert_eq!(ids(&ranked), vec![2, 3, 1]);
    }

    #[test]
    fn test_unspecified_sorts_last_and_ties_use_id() {
        let ranked = DemandRanker::new().rank(vec![
            view(5, Priority::Unspecified, 1),
            view(4, Priority::Low, 9),
            view(3, Priority::Low, 9),
        ]);
        assert_eq!(ids(&ranked), vec![3, 4, 5]);
    }
}
