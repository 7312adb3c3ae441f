use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::models::{Action, Category, ModuleOutcome};

/// Render the end-of-run summary of a compliance run.
///
/// Without `verbose`, only modules that needed more than attribution are listed.
pub fn render(outcomes: &[ModuleOutcome], root: &str, report: &str, verbose: bool, quiet: bool) {
    let total = outcomes.len();
    let notice = count_category(outcomes, Category::Notice);
    let reciprocal = count_category(outcomes, Category::Reciprocal);
    let restricted = count_category(outcomes, Category::Restricted);
    let skipped = outcomes
        .iter()
        .filter(|o| matches!(o.action, Action::Skipped { .. }))
        .count();

    if quiet {
        println!(
            "Total: {}  Notice: {}  Reciprocal: {}  Restricted: {}  Skipped: {}",
            total,
            notice.to_string().green(),
            reciprocal.to_string().yellow(),
            restricted.to_string().red(),
            skipped.to_string().magenta(),
        );
        return;
    }

    println!("\n {} v{}", "providence".bold(), env!("CARGO_PKG_VERSION"));
    println!(" Module: {}\n", root);

    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(" │  {:<48} │", format!("Modules reported   : {}", total - skipped));
    println!(" │  {:<48} │", format!("{}  Notice          : {:>4}", "✓".green(), notice));
    println!(" │  {:<48} │", format!("{}  Reciprocal      : {:>4}", "⚠".yellow(), reciprocal));
    println!(" │  {:<48} │", format!("{}  Restricted      : {:>4}", "✗".red(), restricted));
    println!(" │  {:<48} │", format!("{}  Skipped         : {:>4}", "?".magenta(), skipped));
    println!(" │  {:<48} │", format!("License texts      : {}", report));
    println!(" └────────────────────────────────────────────────────┘\n");

    let listed: Vec<&ModuleOutcome> = outcomes
        .iter()
        .filter(|o| verbose || o.action != Action::Attribution)
        .collect();
    if listed.is_empty() {
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Module").add_attribute(Attribute::Bold),
            Cell::new("License").add_attribute(Attribute::Bold),
            Cell::new("Category").add_attribute(Attribute::Bold),
            Cell::new("Action").add_attribute(Attribute::Bold),
        ]);

    for outcome in listed {
        let (category, color) = match outcome.category {
            Some(Category::Notice) => ("notice", Color::Green),
            Some(Category::Reciprocal) => ("reciprocal", Color::Yellow),
            Some(Category::Restricted) => ("restricted", Color::Red),
            None => ("unknown", Color::DarkGrey),
        };
        let action_color = match outcome.action {
            Action::Skipped { .. } => Color::Magenta,
            _ => Color::Reset,
        };
        table.add_row(vec![
            Cell::new(&outcome.module),
            Cell::new(outcome.license.as_deref().unwrap_or("-")),
            Cell::new(category).fg(color),
            Cell::new(outcome.action.to_string()).fg(action_color),
        ]);
    }

    println!("{}", table);
}

fn count_category(outcomes: &[ModuleOutcome], category: Category) -> usize {
    outcomes
        .iter()
        .filter(|o| o.category == Some(category) && !matches!(o.action, Action::Skipped { .. }))
        .count()
}
