//! `compare` command: the comparison list on file-backed storage.

use anyhow::Result;

use crate::cli::CompareAction;
use crate::config::VitrineConfig;
use crate::log;
use crate::store::FileStore;
use crate::storefront::compare::ComparisonList;
use crate::storefront::toast::{Toast, ToastKind};

/// Apply `action` and return the resulting list.
pub fn run(action: &CompareAction, config: &VitrineConfig) -> Result<Vec<String>> {
    let mut store = FileStore::open(&config.compare.storage)?;
    let mut list = ComparisonList::load(&store, config.compare.max_items);

    let toast = match action {
        CompareAction::Add { id } => Some(list.add(id, &mut store)?),
        CompareAction::Remove { id } => Some(list.remove(id, &mut store)?),
        CompareAction::Clear => Some(list.clear(&mut store)?),
        CompareAction::List => {
            for id in list.ids() {
                println!("{id}");
            }
            list.toggle()
        }
    };

    if let Some(toast) = toast {
        report(&toast);
    }
    Ok(list.ids().to_vec())
}

fn report(toast: &Toast) {
    match toast.kind {
        ToastKind::Success | ToastKind::Info => log!("compare"; "{}", toast.message),
        ToastKind::Warning => log!("warning"; "{}", toast.message),
        ToastKind::Danger => log!("error"; "{}", toast.message),
    }
}
