use clap::Subcommand;
use focustimer_core::storage::{DEFAULT_PICK_COLOR, PICKER_PALETTE};
use focustimer_core::CategoryRepository;

use super::{open_store, CliResult};

#[derive(Subcommand)]
pub enum CategoriesAction {
    /// List categories
    List,
    /// Add a category
    Add {
        /// Category name
        name: String,
        /// Color from the picker palette
        #[arg(long, default_value = DEFAULT_PICK_COLOR)]
        color: String,
    },
    /// Remove a category (the last one cannot be removed)
    Remove {
        /// Category name
        name: String,
    },
}

pub async fn run(action: CategoriesAction) -> CliResult {
    let categories = CategoryRepository::new(open_store()?);

    match action {
        CategoriesAction::List => {
            for c in categories.list().await {
                println!("{}  {}", c.color, c.name);
            }
        }
        CategoriesAction::Add { name, color } => {
            let color = color.to_uppercase();
            if !PICKER_PALETTE.contains(&color.as_str()) {
                return Err(format!(
                    "color must be one of: {}",
                    PICKER_PALETTE.join(", ")
                )
                .into());
            }
            categories.add(&name, &color).await?;
            println!("added {}", name.trim());
        }
        CategoriesAction::Remove { name } => {
            categories.remove(&name).await?;
            println!("removed {name}");
        }
    }
    Ok(())
}
