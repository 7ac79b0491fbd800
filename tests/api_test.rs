// ==========================================
// API 层测试
// ==========================================
// 职责: 装箱 / 需求单 / 参考数据 / 演示数据 API 的集成测试
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod api_test {
    use flood_relief_logistics::api::ApiError;
    use flood_relief_logistics::app::seed_demo_data;
    use flood_relief_logistics::config::config_keys;
    use flood_relief_logistics::domain::{
        DemandStatus, NewFloodCenter, NewSupplyItem, PackLine, Priority, ScanOutcome,
    };
    use uuid::Uuid;

    use crate::test_helpers::{count, insert_demand, seed_reference, setup_state, ts};

    // ==========================================
    // 装箱
    // ==========================================

    #[test]
    fn test_pack_box_generates_unique_uuid_codes() {
        let (_tmp, state) = setup_state();
        let f = seed_reference(&state.connection());

        let lines = [
            PackLine { item_id: f.items[0], quantity: 10 },
            PackLine { item_id: f.items[2], quantity: 4 },
        ];
        let a = state
            .packing_api
            .pack_box(Some(f.centers[0]), Priority::Critical, &lines)
            .unwrap();
        let b = state
            .packing_api
            .pack_box(Some(f.centers[0]), Priority::Critical, &lines)
            .unwrap();

        let code_a = &a.packed.supply_box.qr_code;
        assert!(Uuid::parse_str(code_a).is_ok());
        assert_ne!(code_a, &b.packed.supply_box.qr_code);
        assert_eq!(a.packed.manifest.len(), 2);
        assert_eq!(a.packed.manifest[0].item_name, "Rice");
        assert!(a.message.contains(code_a.as_str()));

        let fetched = state.packing_api.get_box(code_a).unwrap();
        assert_eq!(fetched.supply_box.priority, Priority::Critical);
        assert_eq!(fetched.manifest, a.packed.manifest);
    }

    #[test]
    fn test_pack_box_rejects_non_positive_quantity() {
        let (_tmp, state) = setup_state();
        let conn = state.connection();
        let f = seed_reference(&conn);

        let err = state
            .packing_api
            .pack_box(
                Some(f.centers[0]),
                Priority::High,
                &[
                    PackLine { item_id: f.items[0], quantity: 3 },
                    PackLine { item_id: f.items[1], quantity: 0 },
                ],
            )
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert_eq!(count(&conn, "supply_boxes"), 0);
    }

    #[test]
    fn test_empty_packed_box_scans_successfully() {
        let (_tmp, state) = setup_state();
        let f = seed_reference(&state.connection());

        let packed = state
            .packing_api
            .pack_box(Some(f.centers[1]), Priority::Unspecified, &[])
            .unwrap();
        let resp = state
            .scan_api
            .scan_box(&packed.packed.supply_box.qr_code, f.centers[1], "Faizal")
            .unwrap();
        assert_eq!(resp.outcome, ScanOutcome::Success);
        assert!(resp.report.matched.is_empty());
    }

    #[test]
    fn test_get_box_unknown_code() {
        let (_tmp, state) = setup_state();
        let err = state.packing_api.get_box("missing").unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    // ==========================================
    // 需求单
    // ==========================================

    #[test]
    fn test_create_demand_defaults_and_no_reference_checks() {
        let (_tmp, state) = setup_state();

        // 中心 / 物资都不存在也能创建
        let id = state
            .demand_api
            .create_demand(404, 405, -3, Priority::Medium)
            .unwrap();
        let demand = state.demand_api.get_demand(id).unwrap();
        assert_eq!(demand.status, DemandStatus::Pending);
        assert_eq!(demand.quantity, -3);

        let alerts = state.demand_api.pending_alerts().unwrap();
        assert_eq!(alerts.demands.len(), 1);
        assert!(alerts.demands[0].center_name.is_none());
        assert!(alerts.demands[0].item_name.is_none());
    }

    #[test]
    fn test_update_status_unknown_id() {
        let (_tmp, state) = setup_state();
        let err = state
            .demand_api
            .update_demand_status(999, DemandStatus::Fulfilled)
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_manual_fulfil_removes_from_alerts() {
        let (_tmp, state) = setup_state();
        let conn = state.connection();
        let f = seed_reference(&conn);
        let d = insert_demand(&conn, f.centers[0], f.items[0], 1, Some("High"), ts(8, 0));

        state
            .demand_api
            .update_demand_status(d, DemandStatus::Fulfilled)
            .unwrap();
        let alerts = state.demand_api.pending_alerts().unwrap();
        assert!(alerts.demands.is_empty());
        assert_eq!(alerts.message, "No pending demands");
    }

    #[test]
    fn test_alerts_ranked_by_priority_then_age() {
        let (_tmp, state) = setup_state();
        let conn = state.connection();
        let f = seed_reference(&conn);

        let high_10 = insert_demand(&conn, 1, f.items[0], 1, Some("High"), ts(10, 0));
        let critical_11 = insert_demand(&conn, 2, f.items[1], 1, Some("Critical"), ts(11, 0));
        let high_09 = insert_demand(&conn, 1, f.items[2], 1, Some("High"), ts(9, 0));
        let unspecified = insert_demand(&conn, 2, f.items[0], 1, None, ts(1, 0));

        let alerts = state.demand_api.pending_alerts().unwrap();
        let ids: Vec<i64> = alerts.demands.iter().map(|v| v.demand.demand_id).collect();
        assert_eq!(ids, vec![critical_11, high_09, high_10, unspecified]);
        assert_eq!(alerts.demands[0].center_name.as_deref(), Some("Dewan Orang Ramai"));
        assert_eq!(alerts.demands[0].item_name.as_deref(), Some("Water"));
        assert_eq!(alerts.message, "4 pending demand(s)");

        state
            .config_manager
            .set_value(config_keys::UI_LOCALE, "ms")
            .unwrap();
        let alerts = state.demand_api.pending_alerts().unwrap();
        assert_eq!(alerts.message, "4 permintaan tertunggak");
    }

    #[test]
    fn test_center_demands_newest_first_all_statuses() {
        let (_tmp, state) = setup_state();
        let conn = state.connection();
        let f = seed_reference(&conn);
        let old = insert_demand(&conn, 1, f.items[0], 1, None, ts(6, 0));
        let new = insert_demand(&conn, 1, f.items[1], 1, None, ts(12, 0));
        insert_demand(&conn, 2, f.items[1], 1, None, ts(13, 0));
        state
            .demand_api
            .update_demand_status(old, DemandStatus::Fulfilled)
            .unwrap();

        let rows = state.demand_api.list_center_demands(1).unwrap();
        let ids: Vec<i64> = rows.iter().map(|v| v.demand.demand_id).collect();
        assert_eq!(ids, vec![new, old]);
        assert_eq!(rows[1].demand.status, DemandStatus::Fulfilled);
    }

    #[test]
    fn test_new_demands_filtered_by_center_and_priority() {
        let (_tmp, state) = setup_state();
        let conn = state.connection();
        let f = seed_reference(&conn);
        let c1_high = insert_demand(&conn, 1, f.items[0], 1, Some("High"), ts(8, 0));
        let c1_low = insert_demand(&conn, 1, f.items[1], 1, Some("Low"), ts(9, 0));
        let c2_high = insert_demand(&conn, 2, f.items[0], 1, Some("High"), ts(10, 0));

        let all = state.demand_api.list_new_demands(&[], &[]).unwrap();
        let ids: Vec<i64> = all.iter().map(|v| v.demand.demand_id).collect();
        assert_eq!(ids, vec![c2_high, c1_low, c1_high]);

        let center_one = state.demand_api.list_new_demands(&[1], &[]).unwrap();
        assert_eq!(center_one.len(), 2);

        let high_only = state
            .demand_api
            .list_new_demands(&[], &[Priority::High, Priority::Critical])
            .unwrap();
        let ids: Vec<i64> = high_only.iter().map(|v| v.demand.demand_id).collect();
        assert_eq!(ids, vec![c2_high, c1_high]);

        let both = state
            .demand_api
            .list_new_demands(&[1], &[Priority::High])
            .unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].demand.demand_id, c1_high);
    }

    // ==========================================
    // 参考数据
    // ==========================================

    #[test]
    fn test_reference_data_registration() {
        let (_tmp, state) = setup_state();
        let refs = &state.reference_api;

        let item_id = refs
            .register_item(&NewSupplyItem {
                name: "Baby Formula".to_string(),
                category: Some("Food & Water".to_string()),
                unit: Some("tin".to_string()),
            })
            .unwrap();
        let center_id = refs
            .register_center(&NewFloodCenter {
                name: "SMK Temerloh".to_string(),
                state: Some("Pahang".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(refs.get_item(item_id).unwrap().name, "Baby Formula");
        assert_eq!(refs.get_center(center_id).unwrap().state.as_deref(), Some("Pahang"));
        assert_eq!(refs.list_items().unwrap().len(), 1);
        assert_eq!(refs.list_centers().unwrap().len(), 1);

        let err = refs
            .register_item(&NewSupplyItem {
                name: "   ".to_string(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert!(matches!(refs.get_center(77).unwrap_err(), ApiError::NotFound(_)));
    }

    // ==========================================
    // 演示数据
    // ==========================================

    #[test]
    fn test_demo_seed_produces_scannable_boxes() {
        let (_tmp, state) = setup_state();
        let now = ts(18, 0);
        let summary = seed_demo_data(&state, now).unwrap();

        assert_eq!(summary.center_ids.len(), 2);
        assert_eq!(summary.box_codes.len(), 2);

        // 第一箱发往中心 1，含 Water 与 Rice，两条需求都能核销
        let resp = state
            .scan_api
            .scan_box(&summary.box_codes[0], summary.center_ids[0], "demo")
            .unwrap();
        assert_eq!(resp.outcome, ScanOutcome::Success);
        assert_eq!(resp.report.matched.len(), 2);

        let alerts = state.demand_api.pending_alerts().unwrap();
        assert_eq!(alerts.demands.len(), summary.demand_ids.len() - 2);

        let tracks = state.donation_api.track_donation(&summary.donor_email).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].donation.donation_id, summary.donation_id);
        assert_eq!(tracks[0].unallocated_cents(), 30_000);

        let verified = state.ngo_api.list_verified_ngos().unwrap();
        assert_eq!(verified.len(), 1);
        assert_eq!(verified[0].ngo_id, summary.ngo_id);
        assert_eq!(
            state
                .reference_api
                .supplies_for_center(summary.center_ids[0])
                .unwrap()
                .len(),
            2
        );
    }
}
