// ==========================================
// 洪灾物资调度系统 - 控制台入口
// ==========================================
// 用法:
//   flood-relief-logistics [--db PATH] <command> [args...]
// 输出: JSON
// ==========================================

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use flood_relief_logistics::app::{resolve_db_path, seed_demo_data, AppState};
use flood_relief_logistics::domain::{
    DemandStatus, NewCenterSupply, NewDonation, NewNgo, NewNgoInventory, PackLine, Priority,
    VerificationStatus,
};
use flood_relief_logistics::logging;

#[derive(Parser, Debug)]
#[command(name = "flood-relief-logistics")]
#[command(about = "Flood shelter box scanning and demand reconciliation console")]
#[command(version)]
struct Cli {
    /// 数据库路径（缺省: FLOOD_RELIEF_DB > 本地数据目录 > 当前目录）
    #[arg(long, global = true)]
    db: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 建库并执行迁移
    Init,
    /// 写入演示数据
    Seed,
    /// 扫码签收
    Scan {
        code: String,
        center_id: i64,
        received_by: String,
    },
    /// 待处理需求告警视图
    Alerts,
    /// 某中心全部需求
    CenterDemands { center_id: i64 },
    /// 待处理需求（按中心 / 优先级过滤，逗号分隔）
    NewDemands {
        #[arg(long = "center", value_delimiter = ',')]
        centers: Vec<i64>,
        #[arg(long = "priority", value_delimiter = ',', value_parser = parse_priority)]
        priorities: Vec<Priority>,
    },
    CreateDemand {
        center_id: i64,
        item_id: i64,
        quantity: i64,
        #[arg(value_parser = parse_priority)]
        priority: Option<Priority>,
    },
    SetStatus {
        demand_id: i64,
        #[arg(value_enum, ignore_case = true)]
        status: StatusArg,
    },
    /// 装箱: pack <center_id> <priority> <item_id:qty>... [--ngo ID]
    Pack {
        center_id: i64,
        #[arg(value_parser = parse_priority)]
        priority: Priority,
        #[arg(value_parser = parse_pack_line)]
        lines: Vec<PackLine>,
        /// 装箱后关联的 NGO
        #[arg(long)]
        ngo: Option<i64>,
    },
    Config { key: String, value: String },
    RegisterNgo {
        name: String,
        #[arg(long)]
        registration_no: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    VerifyNgo {
        ngo_id: i64,
        #[arg(value_enum, ignore_case = true, default_value_t = VerificationArg::Verified)]
        status: VerificationArg,
    },
    /// 已审核 NGO 列表
    Ngos,
    AddInventory {
        ngo_id: i64,
        item_id: i64,
        quantity: i64,
        #[arg(long)]
        expiry: Option<NaiveDate>,
        #[arg(long)]
        batch: Option<String>,
        #[arg(long)]
        source: Option<String>,
    },
    Inventory { ngo_id: i64 },
    BoxNgo { box_id: i64 },
    /// 记录捐款，金额以 RM 计（如 125.50）
    Donate {
        ngo_id: i64,
        donor_name: String,
        donor_email: String,
        #[arg(value_parser = parse_amount_cents)]
        amount: i64,
        #[arg(long)]
        method: Option<String>,
    },
    Allocate {
        donation_id: i64,
        purpose: String,
        #[arg(value_parser = parse_amount_cents)]
        amount: i64,
    },
    TrackDonation { donor_email: String },
    /// 登记中心存量（日期缺省为今天）
    RecordStock {
        center_id: i64,
        item_id: i64,
        quantity: i64,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    CenterStock { center_id: i64 },
    RemoveCenter { center_id: i64 },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StatusArg {
    Pending,
    Fulfilled,
}

impl From<StatusArg> for DemandStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => DemandStatus::Pending,
            StatusArg::Fulfilled => DemandStatus::Fulfilled,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VerificationArg {
    Pending,
    Verified,
    Rejected,
}

impl From<VerificationArg> for VerificationStatus {
    fn from(arg: VerificationArg) -> Self {
        match arg {
            VerificationArg::Pending => VerificationStatus::Pending,
            VerificationArg::Verified => VerificationStatus::Verified,
            VerificationArg::Rejected => VerificationStatus::Rejected,
        }
    }
}

fn main() -> Result<()> {
    logging::init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db.as_deref());

    tracing::info!(command = ?cli.command, db_path = %db_path, "flood-relief-logistics {}", flood_relief_logistics::VERSION);
    let state = AppState::new(db_path.clone()).map_err(|e| anyhow!(e))?;

    run(&state, &db_path, cli.command)
}

fn run(state: &AppState, db_path: &str, command: Command) -> Result<()> {
    let today = || chrono::Local::now().date_naive();

    match command {
        Command::Init => print_json(&serde_json::json!({
            "db_path": db_path,
            "schema_version": flood_relief_logistics::db::current_schema_version(),
        })),
        Command::Seed => {
            let summary = seed_demo_data(state, chrono::Local::now().naive_local())?;
            print_json(&summary)
        }
        Command::Scan {
            code,
            center_id,
            received_by,
        } => print_json(&state.scan_api.scan_box(&code, center_id, &received_by)?),
        Command::Alerts => print_json(&state.demand_api.pending_alerts()?),
        Command::CenterDemands { center_id } => {
            print_json(&state.demand_api.list_center_demands(center_id)?)
        }
        Command::NewDemands {
            centers,
            priorities,
        } => print_json(&state.demand_api.list_new_demands(&centers, &priorities)?),
        Command::CreateDemand {
            center_id,
            item_id,
            quantity,
            priority,
        } => {
            let id = state.demand_api.create_demand(
                center_id,
                item_id,
                quantity,
                priority.unwrap_or(Priority::Unspecified),
            )?;
            print_json(&serde_json::json!({ "demand_id": id }))
        }
        Command::SetStatus { demand_id, status } => {
            state
                .demand_api
                .update_demand_status(demand_id, status.into())?;
            print_json(&state.demand_api.get_demand(demand_id)?)
        }
        Command::Pack {
            center_id,
            priority,
            lines,
            ngo,
        } => {
            let resp = state.packing_api.pack_box(Some(center_id), priority, &lines)?;
            match ngo {
                Some(ngo_id) => {
                    let link = state
                        .ngo_api
                        .link_box(resp.packed.supply_box.box_id, ngo_id)?;
                    print_json(&serde_json::json!({ "pack": resp, "ngo": link }))
                }
                None => print_json(&resp),
            }
        }
        Command::Config { key, value } => {
            state.config_manager.set_value(&key, &value)?;
            println!("{}", state.config_manager.get_config_snapshot()?);
            Ok(())
        }
        Command::RegisterNgo {
            name,
            registration_no,
            email,
        } => {
            let id = state.ngo_api.register_ngo(&NewNgo {
                name,
                registration_no,
                contact_email: email,
            })?;
            print_json(&state.ngo_api.get_ngo(id)?)
        }
        Command::VerifyNgo { ngo_id, status } => {
            state.ngo_api.set_verification(ngo_id, status.into())?;
            print_json(&state.ngo_api.get_ngo(ngo_id)?)
        }
        Command::Ngos => print_json(&state.ngo_api.list_verified_ngos()?),
        Command::AddInventory {
            ngo_id,
            item_id,
            quantity,
            expiry,
            batch,
            source,
        } => {
            let id = state.ngo_api.add_inventory(&NewNgoInventory {
                ngo_id,
                item_id,
                quantity,
                expiry_date: expiry,
                batch_id: batch,
                source,
                notes: None,
            })?;
            print_json(&serde_json::json!({ "inventory_id": id }))
        }
        Command::Inventory { ngo_id } => print_json(&state.ngo_api.list_inventory(ngo_id)?),
        Command::BoxNgo { box_id } => print_json(&state.ngo_api.get_box_ngo_info(box_id)?),
        Command::Donate {
            ngo_id,
            donor_name,
            donor_email,
            amount,
            method,
        } => print_json(&state.donation_api.create_donation(&NewDonation {
            ngo_id,
            donor_name,
            donor_email,
            amount_cents: amount,
            payment_method: method,
        })?),
        Command::Allocate {
            donation_id,
            purpose,
            amount,
        } => {
            let id = state
                .donation_api
                .allocate_donation(donation_id, &purpose, amount)?;
            print_json(&serde_json::json!({ "allocation_id": id }))
        }
        Command::TrackDonation { donor_email } => {
            print_json(&state.donation_api.track_donation(&donor_email)?)
        }
        Command::RecordStock {
            center_id,
            item_id,
            quantity,
            date,
        } => {
            let id = state.reference_api.record_center_supply(&NewCenterSupply {
                center_id,
                item_id,
                quantity,
                date: date.unwrap_or_else(today),
            })?;
            print_json(&serde_json::json!({ "stock_id": id }))
        }
        Command::CenterStock { center_id } => {
            print_json(&state.reference_api.supplies_for_center(center_id)?)
        }
        Command::RemoveCenter { center_id } => {
            state.reference_api.remove_center(center_id)?;
            print_json(&serde_json::json!({ "removed_center_id": center_id }))
        }
    }
}

fn parse_priority(raw: &str) -> Result<Priority, String> {
    Ok(Priority::from_db_str(Some(raw.trim())))
}

fn parse_pack_line(raw: &str) -> Result<PackLine> {
    let (item, qty) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("expected item_id:qty, got {}", raw))?;
    Ok(PackLine {
        item_id: item
            .trim()
            .parse()
            .with_context(|| format!("invalid item id: {}", item))?,
        quantity: qty
            .trim()
            .parse()
            .with_context(|| format!("invalid quantity: {}", qty))?,
    })
}

/// "125.50" -> 12550；最多两位小数
fn parse_amount_cents(raw: &str) -> Result<i64> {
    let raw = raw.trim();
    let (whole, frac) = raw.split_once('.').unwrap_or((raw, ""));
    if whole.starts_with('-') || frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(anyhow!("invalid amount: {}", raw));
    }
    let whole: i64 = whole
        .parse()
        .with_context(|| format!("invalid amount: {}", raw))?;
    let frac: i64 = format!("{:0<2}", frac).parse().unwrap_or(0);
    whole
        .checked_mul(100)
        .and_then(|c| c.checked_add(frac))
        .ok_or_else(|| anyhow!("amount out of range: {}", raw))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("flood-relief-logistics").chain(args.iter().copied()))
    }

    #[test]
    fn test_trailing_db_without_value_is_an_error() {
        let err = parse(&["alerts", "--db"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);

        assert!(parse(&["--db"]).is_err());
    }

    #[test]
    fn test_db_flag_accepted_before_or_after_command() {
        let cli = parse(&["--db", "/tmp/a.db", "alerts"]).unwrap();
        assert_eq!(cli.db.as_deref(), Some("/tmp/a.db"));
        let cli = parse(&["alerts", "--db", "/tmp/b.db"]).unwrap();
        assert_eq!(cli.db.as_deref(), Some("/tmp/b.db"));
        assert!(parse(&["alerts"]).unwrap().db.is_none());
    }

    #[test]
    fn test_scan_takes_three_positionals() {
        let cli = parse(&["scan", "QR-1", "2", "Aminah"]).unwrap();
        match cli.command {
            Command::Scan {
                code,
                center_id,
                received_by,
            } => {
                assert_eq!(code, "QR-1");
                assert_eq!(center_id, 2);
                assert_eq!(received_by, "Aminah");
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(parse(&["scan", "QR-1", "2"]).is_err());
        assert!(parse(&["scan", "QR-1", "two", "Aminah"]).is_err());
    }

    #[test]
    fn test_pack_lines_and_filters() {
        let cli = parse(&["pack", "1", "Critical", "3:10", "4:2", "--ngo", "7"]).unwrap();
        match cli.command {
            Command::Pack {
                center_id,
                priority,
                lines,
                ngo,
            } => {
                assert_eq!(center_id, 1);
                assert_eq!(priority, Priority::Critical);
                assert_eq!(lines, vec![
                    PackLine { item_id: 3, quantity: 10 },
                    PackLine { item_id: 4, quantity: 2 },
                ]);
                assert_eq!(ngo, Some(7));
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(parse(&["pack", "1", "High", "3x10"]).is_err());

        let cli = parse(&["new-demands", "--center", "1,2", "--priority", "High,Low"]).unwrap();
        match cli.command {
            Command::NewDemands {
                centers,
                priorities,
            } => {
                assert_eq!(centers, vec![1, 2]);
                assert_eq!(priorities, vec![Priority::High, Priority::Low]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!(parse(&["set-status", "5", "Done"]).is_err());
        assert!(parse(&["set-status", "5", "Fulfilled"]).is_ok());
        assert!(parse(&["set-status", "5", "pending"]).is_ok());
    }

    #[test]
    fn test_parse_amount_cents() {
        assert_eq!(parse_amount_cents("125.50").unwrap(), 12_550);
        assert_eq!(parse_amount_cents("125.5").unwrap(), 12_550);
        assert_eq!(parse_amount_cents("40").unwrap(), 4_000);
        assert!(parse_amount_cents("1.234").is_err());
        assert!(parse_amount_cents("abc").is_err());
        assert!(parse_amount_cents("1.x").is_err());
        assert!(parse_amount_cents("-5.50").is_err());
    }
}
