// ==========================================
// 洪灾物资调度系统 - 扫码核销引擎
// ==========================================
// 职责: 接收中心扫描箱码后，把清单逐行核销到该中心最早的待处理需求
// 输入: 箱码 + 接收中心 + 签收人
// 输出: ScanReport（结果、箱、清单、已核销行、未核销行）
// ==========================================
// 红线: 整次扫码在一个事务内完成，任何写入失败整体回滚
// 红线: 选单按 request_date 升序、demand_id 升序，不看优先级
// ==========================================

use crate::config::ReconcileConfig;
use crate::domain::delivery::{NewDelivery, UnmatchedReceipt};
use crate::domain::supply_box::{ManifestLine, SupplyBox};
use crate::domain::types::{DemandStatus, ScanOutcome, UnmatchedReason};
use crate::perf::PerfGuard;
use crate::repository::error::RepositoryResult;
use crate::repository::reconcile_store::{ReconcileStore, ScanStore};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

// ==========================================
// 核销结果
// ==========================================

/// 已核销的清单行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineMatch {
    pub content_id: i64,
    pub item_id: i64,
    pub item_name: String,
    pub quantity: i64,
    pub demand_id: i64,
    pub delivery_id: i64,
}

/// 未核销的清单行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmatchedLine {
    pub content_id: i64,
    pub item_id: i64,
    pub item_name: String,
    pub quantity: i64,
    pub reason: UnmatchedReason,
}

/// 一次扫码的完整结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub outcome: ScanOutcome,
    pub supply_box: Option<SupplyBox>,
    pub manifest: Vec<ManifestLine>,
    pub matched: Vec<LineMatch>,
    pub unmatched: Vec<UnmatchedLine>,
}

impl ScanReport {
    fn not_found() -> Self {
        Self {
            outcome: ScanOutcome::NotFound,
            supply_box: None,
            manifest: Vec::new(),
            matched: Vec::new(),
            unmatched: Vec::new(),
        }
    }
}

enum LineDecision {
    Matched(LineMatch),
    Unmatched(UnmatchedLine),
}

// ==========================================
// ReconcileEngine - 扫码核销引擎
// ==========================================
pub struct ReconcileEngine<S: ReconcileStore> {
    store: S,
    config: ReconcileConfig,
}

impl<S: ReconcileStore> ReconcileEngine<S> {
    pub fn new(store: S, config: ReconcileConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> ReconcileConfig {
        self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 以当前本地时间核销
    pub fn reconcile(
        &self,
        code: &str,
        center_id: i64,
        received_by: &str,
    ) -> RepositoryResult<ScanReport> {
        self.reconcile_at(code, center_id, received_by, chrono::Local::now().naive_local())
    }

    /// 核销一次扫码
    ///
    /// # 参数
    /// - code: 扫到的箱码（原样匹配）
    /// - center_id: 接收中心
    /// - received_by: 签收人
    /// - now: 签收时间（写入 Delivery.delivery_date）
    ///
    /// # 返回
    /// - Ok(ScanReport): outcome=NotFound 时不产生任何写入
    /// - Err: 存储失败，事务已回滚
    #[instrument(skip(self), fields(strict = self.config.strict_quantity_match))]
    pub fn reconcile_at(
        &self,
        code: &str,
        center_id: i64,
        received_by: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<ScanReport> {
        let perf = PerfGuard::new("reconcile_scan");

        let report = self.store.run_in_transaction(|store| {
            let supply_box = match store.resolve_box_by_code(code)? {
                Some(b) => b,
                None => return Ok(ScanReport::not_found()),
            };

            let manifest = store.load_manifest(supply_box.box_id)?;

            let mut matched = Vec::new();
            let mut unmatched = Vec::new();
            for line in &manifest {
                match self.reconcile_line(store, &supply_box, line, center_id, received_by, now)? {
                    LineDecision::Matched(m) => matched.push(m),
                    LineDecision::Unmatched(u) => unmatched.push(u),
                }
            }

            Ok(ScanReport {
                outcome: ScanOutcome::Success,
                supply_box: Some(supply_box),
                manifest,
                matched,
                unmatched,
            })
        })?;

        match &report.supply_box {
            Some(b) => info!(
                box_id = b.box_id,
                center_id,
                matched = report.matched.len(),
                unmatched = report.unmatched.len(),
                sql_count = perf.snapshot().sql_count,
                "扫码核销完成"
            ),
            None => warn!(center_id, "箱码不存在，未做任何核销"),
        }

        Ok(report)
    }

    /// 核销单个清单行
    ///
    /// 同一箱内的多行相互独立；前一行已核销的需求在同一事务内不再是 Pending，
    /// 因此同物资的后续行会落到下一条最早需求
    fn reconcile_line(
        &self,
        store: &dyn ScanStore,
        supply_box: &SupplyBox,
        line: &ManifestLine,
        center_id: i64,
        received_by: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<LineDecision> {
        let reason = match store.find_oldest_pending_demand(center_id, line.item_id)? {
            None => UnmatchedReason::NoPendingDemand,
            Some(demand)
                if self.config.strict_quantity_match && line.quantity < demand.quantity =>
            {
                debug!(
                    item_id = line.item_id,
                    demand_id = demand.demand_id,
                    line_quantity = line.quantity,
                    demand_quantity = demand.quantity,
                    "严格模式: 数量不足，需求保持待处理"
                );
                UnmatchedReason::QuantityShortfall
            }
            Some(demand) => {
                let delivery_id = store.record_delivery(&NewDelivery {
                    box_id: supply_box.box_id,
                    demand_id: demand.demand_id,
                    center_id,
                    delivery_date: now,
                    received_by: received_by.to_string(),
                })?;
                store.set_demand_status(
                    demand.demand_id,
                    DemandStatus::Pending,
                    DemandStatus::Fulfilled,
                )?;

                debug!(
                    item_id = line.item_id,
                    demand_id = demand.demand_id,
                    delivery_id,
                    "清单行已核销"
                );
                return Ok(LineDecision::Matched(LineMatch {
                    content_id: line.content_id,
                    item_id: line.item_id,
                    item_name: line.item_name.clone(),
                    quantity: line.quantity,
                    demand_id: demand.demand_id,
                    delivery_id,
                }));
            }
        };

        warn!(
            box_id = supply_box.box_id,
            center_id,
            item_id = line.item_id,
            quantity = line.quantity,
            reason = %reason,
            "清单行未核销"
        );

        if self.config.record_unmatched {
            store.record_unmatched(&UnmatchedReceipt {
                receipt_id: None,
                box_id: supply_box.box_id,
                item_id: line.item_id,
                quantity: line.quantity,
                center_id,
                received_at: now,
                received_by: received_by.to_string(),
                reason,
            })?;
        }

        Ok(LineDecision::Unmatched(UnmatchedLine {
            content_id: line.content_id,
            item_id: line.item_id,
            item_name: line.item_name.clone(),
            quantity: line.quantity,
            reason,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::demand::Demand;
    use crate::domain::types::Priority;
    use crate::repository::error::RepositoryError;
    use chrono::NaiveDate;
    use std::cell::RefCell;
    use std::sync::Mutex;

    // ==========================================
    // 内存存储：事务 = 克隆状态，成功后整体写回
    // ==========================================

    #[derive(Clone, Default)]
    struct MemState {
        boxes: Vec<SupplyBox>,
        lines: Vec<ManifestLine>,
        demands: Vec<Demand>,
        deliveries: Vec<NewDelivery>,
        unmatched: Vec<UnmatchedReceipt>,
    }

    #[derive(Default)]
    struct MemStore {
        state: Mutex<MemState>,
        fail_on_delivery: Option<usize>,
    }

    struct MemScope {
        state: RefCell<MemState>,
        fail_on_delivery: Option<usize>,
    }

    impl ReconcileStore for MemStore {
        fn run_in_transaction<T, F>(&self, work: F) -> RepositoryResult<T>
        where
            F: FnOnce(&dyn ScanStore) -> RepositoryResult<T>,
        {
            let mut guard = self.state.lock().unwrap();
            let scope = MemScope {
                state: RefCell::new(guard.clone()),
                fail_on_delivery: self.fail_on_delivery,
            };
            let value = work(&scope)?;
            *guard = scope.state.into_inner();
            Ok(value)
        }
    }

    impl ScanStore for MemScope {
        fn resolve_box_by_code(&self, code: &str) -> RepositoryResult<Option<SupplyBox>> {
            Ok(self.state.borrow().boxes.iter().find(|b| b.qr_code == code).cloned())
        }

        fn load_manifest(&self, box_id: i64) -> RepositoryResult<Vec<ManifestLine>> {
            Ok(self
                .state
                .borrow()
                .lines
                .iter()
                .filter(|l| l.box_id == box_id)
                .cloned()
                .collect())
        }

        fn find_oldest_pending_demand(
            &self,
            center_id: i64,
            item_id: i64,
        ) -> RepositoryResult<Option<Demand>> {
            Ok(self
                .state
                .borrow()
                .demands
                .iter()
                .filter(|d| {
                    d.center_id == center_id
                        && d.item_id == item_id
                        && d.status == DemandStatus::Pending
                })
                .min_by_key(|d| (d.request_date, d.demand_id))
                .cloned())
        }

        fn record_delivery(&self, delivery: &NewDelivery) -> RepositoryResult<i64> {
            let mut state = self.state.borrow_mut();
            if Some(state.deliveries.len()) == self.fail_on_delivery {
                return Err(RepositoryError::DatabaseQueryError("disk I/O error".to_string()));
            }
            state.deliveries.push(delivery.clone());
            Ok(state.deliveries.len() as i64)
        }

        fn set_demand_status(
            &self,
            demand_id: i64,
            from: DemandStatus,
            to: DemandStatus,
        ) -> RepositoryResult<()> {
            let mut state = self.state.borrow_mut();
            let demand = state
                .demands
                .iter_mut()
                .find(|d| d.demand_id == demand_id)
                .ok_or_else(|| RepositoryError::not_found("Demand", demand_id))?;
            if demand.status != from {
                return Err(RepositoryError::InvalidStateTransition {
                    demand_id,
                    from: demand.status.to_string(),
                    to: to.to_string(),
                });
            }
            demand.status = to;
            Ok(())
        }

        fn record_unmatched(&self, receipt: &UnmatchedReceipt) -> RepositoryResult<i64> {
            let mut state = self.state.borrow_mut();
            state.unmatched.push(receipt.clone());
            Ok(state.unmatched.len() as i64)
        }
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 12, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn demand(id: i64, item_id: i64, quantity: i64, h: u32) -> Demand {
        Demand {
            demand_id: id,
            center_id: 1,
            item_id,
            quantity,
            priority: Priority::Medium,
            request_date: at(h, 0),
            status: DemandStatus::Pending,
        }
    }

    fn line(content_id: i64, item_id: i64, quantity: i64) -> ManifestLine {
        ManifestLine {
            content_id,
            box_id: 1,
            item_id,
            item_name: format!("item-{}", item_id),
            quantity,
        }
    }

    fn store_with(lines: Vec<ManifestLine>, demands: Vec<Demand>) -> MemStore {
        MemStore {
            state: Mutex::new(MemState {
                boxes: vec![SupplyBox {
                    box_id: 1,
                    qr_code: "QR-1".to_string(),
                    created_at: at(6, 0),
                    destination_center_id: Some(1),
                    priority: Priority::High,
                }],
                lines,
                demands,
                ..Default::default()
            }),
            fail_on_delivery: None,
        }
    }

    fn engine(store: MemStore) -> ReconcileEngine<MemStore> {
        ReconcileEngine::new(store, ReconcileConfig::default())
    }

    #[test]
    fn test_unknown_code_is_not_found() {
        let engine = engine(store_with(vec![line(1, 1, 5)], vec![demand(1, 1, 5, 8)]));
        let report = engine.reconcile_at("qr-1", 1, "ali", at(12, 0)).unwrap();

        assert_eq!(report.outcome, ScanOutcome::NotFound);
        assert!(report.supply_box.is_none());
        let state = engine.store().state.lock().unwrap();
        assert!(state.deliveries.is_empty());
        assert_eq!(state.demands[0].status, DemandStatus::Pending);
    }

    #[test]
    fn test_oldest_demand_wins_regardless_of_priority() {
        let mut newer_critical = demand(1, 1, 5, 10);
        newer_critical.priority = Priority::Critical;
        let older_low = Demand {
            priority: Priority::Low,
            ..demand(2, 1, 5, 8)
        };
        let engine = engine(store_with(vec![line(1, 1, 5)], vec![newer_critical, older_low]));

        let report = engine.reconcile_at("QR-1", 1, "ali", at(12, 0)).unwrap();
        assert_eq!(report.matched.len(), 1);
        assert_eq!(report.matched[0].demand_id, 2);
    }

    #[test]
    fn test_same_item_twice_fills_two_demands() {
        let engine = engine(store_with(
            vec![line(1, 1, 5), line(2, 1, 5)],
            vec![demand(1, 1, 5, 8), demand(2, 1, 5, 9)],
        ));
        let report = engine.reconcile_at("QR-1", 1, "ali", at(12, 0)).unwrap();

        let ids: Vec<i64> = report.matched.iter().map(|m| m.demand_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(report.unmatched.is_empty());
    }

    #[test]
    fn test_line_without_demand_is_reported_and_audited() {
        let engine = engine(store_with(
            vec![line(1, 1, 5), line(2, 7, 3)],
            vec![demand(1, 1, 5, 8)],
        ));
        let report = engine.reconcile_at("QR-1", 1, "ali", at(12, 0)).unwrap();

        assert_eq!(report.outcome, ScanOutcome::Success);
        assert_eq!(report.matched.len(), 1);
        assert_eq!(report.unmatched.len(), 1);
        assert_eq!(report.unmatched[0].item_id, 7);
        assert_eq!(report.unmatched[0].reason, UnmatchedReason::NoPendingDemand);

        let state = engine.store().state.lock().unwrap();
        assert_eq!(state.unmatched.len(), 1);
        assert_eq!(state.unmatched[0].received_by, "ali");
    }

    #[test]
    fn test_unmatched_audit_can_be_disabled() {
        let engine = ReconcileEngine::new(
            store_with(vec![line(1, 7, 3)], vec![]),
            ReconcileConfig {
                strict_quantity_match: false,
                record_unmatched: false,
            },
        );
        let report = engine.reconcile_at("QR-1", 1, "ali", at(12, 0)).unwrap();

        assert_eq!(report.unmatched.len(), 1);
        assert!(engine.store().state.lock().unwrap().unmatched.is_empty());
    }

    #[test]
    fn test_quantity_ignored_by_default() {
        let engine = engine(store_with(vec![line(1, 1, 1)], vec![demand(1, 1, 100, 8)]));
        let report = engine.reconcile_at("QR-1", 1, "ali", at(12, 0)).unwrap();
        assert_eq!(report.matched.len(), 1);
    }

    #[test]
    fn test_strict_mode_keeps_demand_pending_on_shortfall() {
        let engine = ReconcileEngine::new(
            store_with(vec![line(1, 1, 4)], vec![demand(1, 1, 5, 8)]),
            ReconcileConfig {
                strict_quantity_match: true,
                record_unmatched: true,
            },
        );
        let report = engine.reconcile_at("QR-1", 1, "ali", at(12, 0)).unwrap();

        assert!(report.matched.is_empty());
        assert_eq!(report.unmatched[0].reason, UnmatchedReason::QuantityShortfall);
        let state = engine.store().state.lock().unwrap();
        assert_eq!(state.demands[0].status, DemandStatus::Pending);
        assert_eq!(state.unmatched[0].reason, UnmatchedReason::QuantityShortfall);
    }

    #[test]
    fn test_failure_mid_scan_rolls_back_everything() {
        let mut store = store_with(
            vec![line(1, 1, 5), line(2, 2, 5)],
            vec![demand(1, 1, 5, 8), demand(2, 2, 5, 8)],
        );
        store.fail_on_delivery = Some(1);
        let engine = engine(store);

        let err = engine.reconcile_at("QR-1", 1, "ali", at(12, 0)).unwrap_err();
        assert!(matches!(err, RepositoryError::DatabaseQueryError(_)));

        let state = engine.store().state.lock().unwrap();
        assert!(state.deliveries.is_empty());
        assert!(state
            .demands
            .iter()
            .all(|d| d.status == DemandStatus::Pending));
    }

    #[test]
    fn test_empty_manifest_succeeds_without_writes() {
        let engine = engine(store_with(vec![], vec![demand(1, 1, 5, 8)]));
        let report = engine.reconcile_at("QR-1", 1, "ali", at(12, 0)).unwrap();

        assert_eq!(report.outcome, ScanOutcome::Success);
        assert!(report.manifest.is_empty());
        assert!(report.matched.is_empty());
        assert!(report.unmatched.is_empty());
        assert!(engine.store().state.lock().unwrap().deliveries.is_empty());
    }
}
