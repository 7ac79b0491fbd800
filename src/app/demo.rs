// ==========================================
// 洪灾物资调度系统 - 演示数据
// ==========================================
// 用途: 控制台 `seed` 命令 / seed_demo_db 工具
// 场景: 吉兰丹两处安置中心，若干需求与两只已装箱的物资箱；
//       一家已审核 NGO 认领首箱，并有一笔捐款与中心存量登记
// ==========================================

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::api::ApiResult;
use crate::app::AppState;
use crate::domain::demand::NewDemand;
use crate::domain::donation::NewDonation;
use crate::domain::ngo::{NewNgo, NewNgoInventory};
use crate::domain::reference::{NewCenterSupply, NewFloodCenter, NewSupplyItem};
use crate::domain::supply_box::PackLine;
use crate::domain::types::{Priority, VerificationStatus};
use crate::repository::demand_repo::DemandRepository;

/// 种子数据摘要
#[derive(Debug, Clone, Serialize)]
pub struct DemoSummary {
    pub center_ids: Vec<i64>,
    pub item_ids: Vec<i64>,
    pub demand_ids: Vec<i64>,
    /// 已装箱的箱码（可直接用于 `scan`）
    pub box_codes: Vec<String>,
    pub ngo_id: i64,
    pub donation_id: i64,
    /// 演示捐款人邮箱（可直接用于 `track-donation`）
    pub donor_email: String,
}

fn item(name: &str, category: &str, unit: &str) -> NewSupplyItem {
    NewSupplyItem {
        name: name.to_string(),
        category: Some(category.to_string()),
        unit: Some(unit.to_string()),
    }
}

fn center(name: &str, state: &str, phone: &str) -> NewFloodCenter {
    NewFloodCenter {
        name: name.to_string(),
        state: Some(state.to_string()),
        address: None,
        contact_phone: Some(phone.to_string()),
    }
}

/// 写入演示数据
///
/// 需求单时间以 `now` 为基准往前推，保证告警视图顺序稳定
pub fn seed_demo_data(state: &AppState, now: NaiveDateTime) -> ApiResult<DemoSummary> {
    let refs = &state.reference_api;

    let center_ids = vec![
        refs.register_center(&center("SK Kampung Sireh", "Kelantan", "09-7441234"))?,
        refs.register_center(&center("Dewan Orang Ramai Kuala Krai", "Kelantan", "09-9665678"))?,
    ];

    let item_ids = vec![
        refs.register_item(&item("Rice 5kg", "Food & Water", "bag"))?,
        refs.register_item(&item("Bottled Water 1.5L", "Food & Water", "bottle"))?,
        refs.register_item(&item("Blanket", "Clothing & Bedding", "pcs"))?,
        refs.register_item(&item("Hygiene Kit", "Hygiene", "kit"))?,
    ];

    // 需求单直接写仓储以便指定 request_date
    let demand_repo = DemandRepository::new(state.connection());
    let plan: [(usize, usize, i64, Priority, i64); 6] = [
        (0, 0, 20, Priority::High, 9),
        (0, 1, 100, Priority::Critical, 5),
        (0, 2, 30, Priority::Medium, 8),
        (1, 0, 15, Priority::High, 7),
        (1, 3, 40, Priority::Low, 6),
        (1, 1, 80, Priority::Unspecified, 4),
    ];
    let mut demand_ids = Vec::with_capacity(plan.len());
    for (c, i, quantity, priority, hours_ago) in plan {
        demand_ids.push(demand_repo.create(&NewDemand {
            center_id: center_ids[c],
            item_id: item_ids[i],
            quantity,
            priority,
            request_date: Some(now - Duration::hours(hours_ago)),
        })?);
    }

    let packing = &state.packing_api;
    let kelantan_box = packing.pack_box(
        Some(center_ids[0]),
        Priority::Critical,
        &[
            PackLine { item_id: item_ids[1], quantity: 100 },
            PackLine { item_id: item_ids[0], quantity: 20 },
        ],
    )?;
    let krai_box = packing.pack_box(
        Some(center_ids[1]),
        Priority::High,
        &[
            PackLine { item_id: item_ids[0], quantity: 15 },
            PackLine { item_id: item_ids[2], quantity: 10 },
        ],
    )?;

    // NGO 与捐款
    let ngo_id = state.ngo_api.register_ngo(&NewNgo {
        name: "MERCY Malaysia".to_string(),
        registration_no: Some("PPM-001-10-1999".to_string()),
        contact_email: Some("relief@mercy.org.my".to_string()),
    })?;
    state
        .ngo_api
        .set_verification(ngo_id, VerificationStatus::Verified)?;
    state.ngo_api.add_inventory(&NewNgoInventory {
        ngo_id,
        item_id: item_ids[3],
        quantity: 200,
        expiry_date: None,
        batch_id: Some("HK-2024-12".to_string()),
        source: Some("Gudang Kota Bharu".to_string()),
        notes: None,
    })?;
    state
        .ngo_api
        .link_box(kelantan_box.packed.supply_box.box_id, ngo_id)?;

    let donor_email = "donor@example.my".to_string();
    let donation_id = state
        .donation_api
        .create_donation(&NewDonation {
            ngo_id,
            donor_name: "Nur Aisyah".to_string(),
            donor_email: donor_email.clone(),
            amount_cents: 50_000,
            payment_method: Some("FPX".to_string()),
        })?
        .donation
        .donation_id;
    state
        .donation_api
        .allocate_donation(donation_id, "Hygiene kits", 20_000)?;

    for (c, i, quantity) in [(0, 0, 60), (0, 1, 240), (1, 2, 35)] {
        refs.record_center_supply(&NewCenterSupply {
            center_id: center_ids[c],
            item_id: item_ids[i],
            quantity,
            date: now.date(),
        })?;
    }

    let box_codes = vec![
        kelantan_box.packed.supply_box.qr_code,
        krai_box.packed.supply_box.qr_code,
    ];

    tracing::info!(
        centers = center_ids.len(),
        items = item_ids.len(),
        demands = demand_ids.len(),
        boxes = box_codes.len(),
        "演示数据已写入"
    );

    Ok(DemoSummary {
        center_ids,
        item_ids,
        demand_ids,
        box_codes,
        ngo_id,
        donation_id,
        donor_email,
    })
}
