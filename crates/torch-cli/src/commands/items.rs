use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};
use torch_core::items::{group_by_parent, group_rows, DreamRollup, ItemRow};
use torch_core::{find_item_by_id, ItemSet, ItemType};

#[derive(Clone, Copy, ValueEnum)]
pub enum TypeArg {
    Task,
    Goal,
    Dream,
}

impl From<TypeArg> for ItemType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Task => ItemType::Task,
            TypeArg::Goal => ItemType::Goal,
            TypeArg::Dream => ItemType::Dream,
        }
    }
}

#[derive(Subcommand)]
pub enum ItemsAction {
    /// Progress of every dream in the snapshot
    Report {
        /// Snapshot file (JSON array or {dreams, goals, tasks} object)
        #[arg(long)]
        file: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Group items of one type by their parent
    Groups {
        #[arg(long)]
        file: PathBuf,
        #[arg(long, value_enum)]
        r#type: TypeArg,
        /// Only include items whose title contains this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Look up one item by id
    Find {
        #[arg(long)]
        file: PathBuf,
        id: u64,
    },
    /// Search items of one type by title
    Search {
        #[arg(long)]
        file: PathBuf,
        #[arg(long, value_enum)]
        r#type: TypeArg,
        /// Case-insensitive title fragment; empty matches everything
        #[arg(default_value = "")]
        text: String,
    },
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct DreamReport<'a> {
    id: u64,
    title: &'a str,
    #[serde(flatten)]
    rollup: DreamRollup,
}

pub fn run(action: ItemsAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ItemsAction::Report { file, json } => {
            let set = ItemSet::load(&file)?;
            let reports: Vec<DreamReport> = set
                .dreams
                .iter()
                .map(|dream| DreamReport {
                    id: dream.id,
                    title: &dream.title,
                    rollup: dream.roll_up(),
                })
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for report in &reports {
                    println!(
                        "{:>5.1}%  {}",
                        report.rollup.progress * 100.0,
                        report.title
                    );
                }
            }
        }
        ItemsAction::Groups {
            file,
            r#type,
            search,
        } => {
            let set = ItemSet::load(&file)?;
            let item_type = ItemType::from(r#type);
            let rows: Vec<ItemRow>;
            let groups = match search {
                Some(text) => {
                    rows = set.search(item_type, &text);
                    group_rows(&rows)
                }
                None => {
                    rows = set.rows();
                    group_by_parent(&rows, item_type)
                }
            };
            println!("{}", serde_json::to_string_pretty(&groups)?);
        }
        ItemsAction::Find { file, id } => {
            let set = ItemSet::load(&file)?;
            match find_item_by_id(id, &set) {
                Some(item) => println!("{}", serde_json::to_string_pretty(&item.row())?),
                None => return Err(format!("no item with id {id}").into()),
            }
        }
        ItemsAction::Search {
            file,
            r#type,
            text,
        } => {
            let set = ItemSet::load(&file)?;
            let rows = set.search(r#type.into(), &text);
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }
    Ok(())
}
