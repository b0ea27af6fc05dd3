//! Command registry and handlers for the interactive shell.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use uuid::Uuid;

use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::core::aggregates;
use crate::core::notify::Collection;
use crate::core::services::{
    AccountService, AllocationDraft, AllocationOutcome, AllocationService, AllocationUpdate,
    BudgetService, CategoryService, DebtService, EntryFilter, ReportFilter, ReportService,
    TransferDraft, TransferService,
};
use crate::domain::{AccountKind, AllocationTarget, DebtStatus, ReportKind};
use crate::storage::workspace_warnings;

pub(crate) struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
    pub handler: fn(&mut ShellContext, &[&str]) -> CommandResult,
}

pub(crate) fn registry() -> &'static [CommandSpec] {
    COMMANDS.as_slice()
}

static COMMANDS: Lazy<Vec<CommandSpec>> = Lazy::new(|| {
    vec![
        CommandSpec {
            name: "help",
            usage: "help [command]",
            description: "Show available commands or details for one.",
            handler: cmd_help,
        },
        CommandSpec {
            name: "open",
            usage: "open <owner>",
            description: "Open (or create) the workspace for an owner.",
            handler: cmd_open,
        },
        CommandSpec {
            name: "save",
            usage: "save",
            description: "Persist the current workspace.",
            handler: cmd_save,
        },
        CommandSpec {
            name: "backup",
            usage: "backup [note]",
            description: "Create a timestamped workspace backup.",
            handler: cmd_backup,
        },
        CommandSpec {
            name: "backups",
            usage: "backups",
            description: "List available backups for the current owner.",
            handler: cmd_backups,
        },
        CommandSpec {
            name: "restore",
            usage: "restore <backup-name>",
            description: "Restore the workspace from a backup.",
            handler: cmd_restore,
        },
        CommandSpec {
            name: "account",
            usage: "account <add|list|balance|remove> ...",
            description: "Manage accounts.",
            handler: cmd_account,
        },
        CommandSpec {
            name: "debt",
            usage: "debt <add|list|status|due|remove> ...",
            description: "Manage debts and loans.",
            handler: cmd_debt,
        },
        CommandSpec {
            name: "category",
            usage: "category <add|list|rename|remove> ...",
            description: "Manage expense categories.",
            handler: cmd_category,
        },
        CommandSpec {
            name: "expense",
            usage: "expense <add|list|edit|remove> ...",
            description: "Record and manage allocation entries.",
            handler: cmd_expense,
        },
        CommandSpec {
            name: "transfer",
            usage: "transfer <add|list|remove> ...",
            description: "Move money between accounts.",
            handler: cmd_transfer,
        },
        CommandSpec {
            name: "budget",
            usage: "budget <add|list|remove> ...",
            description: "Plan monthly amounts per account.",
            handler: cmd_budget,
        },
        CommandSpec {
            name: "report",
            usage: "report <create|list|show|remove> ...",
            description: "Create and inspect financial report snapshots.",
            handler: cmd_report,
        },
        CommandSpec {
            name: "summary",
            usage: "summary [months]",
            description: "Show net worth and recent monthly spending.",
            handler: cmd_summary,
        },
        CommandSpec {
            name: "warnings",
            usage: "warnings",
            description: "Scan the workspace for dangling references.",
            handler: cmd_warnings,
        },
        CommandSpec {
            name: "exit",
            usage: "exit",
            description: "Leave the shell.",
            handler: cmd_exit,
        },
        CommandSpec {
            name: "quit",
            usage: "quit",
            description: "Leave the shell.",
            handler: cmd_exit,
        },
    ]
});

fn usage(text: &str) -> CommandError {
    CommandError::InvalidArguments(format!("usage: {text}"))
}

fn parse_amount(raw: &str) -> Result<f64, CommandError> {
    raw.parse::<f64>()
        .map_err(|_| CommandError::InvalidArguments(format!("`{raw}` is not a valid amount")))
}

fn parse_date(raw: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| CommandError::InvalidArguments(format!("`{raw}` is not a YYYY-MM-DD date")))
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

fn account_id_by_name(context: &ShellContext, name: &str) -> Result<Uuid, CommandError> {
    context
        .workspace()?
        .account_by_name(name)
        .map(|account| account.id)
        .ok_or_else(|| CommandError::InvalidArguments(format!("account `{name}` not found")))
}

fn debt_id_by_name(context: &ShellContext, name: &str) -> Result<Uuid, CommandError> {
    context
        .workspace()?
        .debt_by_name(name)
        .map(|debt| debt.id)
        .ok_or_else(|| CommandError::InvalidArguments(format!("debt `{name}` not found")))
}

fn category_id_by_name(context: &ShellContext, name: &str) -> Result<Uuid, CommandError> {
    context
        .workspace()?
        .category_by_name(name)
        .map(|category| category.id)
        .ok_or_else(|| CommandError::InvalidArguments(format!("category `{name}` not found")))
}

fn report_mirror_warnings(outcome: &AllocationOutcome) {
    for warning in &outcome.warnings {
        output::warning(warning.to_string());
    }
}

/// Which collections a mirrored target touches besides the entries.
fn entry_collections(target: &AllocationTarget) -> Vec<Collection> {
    match target {
        AllocationTarget::Category(_) => vec![Collection::Expenses],
        AllocationTarget::AccountDeposit(_) => vec![Collection::Expenses, Collection::Accounts],
        AllocationTarget::DebtPayment(_) => vec![Collection::Expenses, Collection::Debts],
    }
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first() {
        Some(name) => match registry().iter().find(|spec| spec.name == *name) {
            Some(spec) => {
                output::info(format!("{} - {}", spec.usage, spec.description));
                Ok(())
            }
            None => {
                context.suggest_command(name);
                Ok(())
            }
        },
        None => {
            output::section("Commands");
            for spec in registry().iter() {
                output::info(format!("  {:<42} {}", spec.usage, spec.description));
            }
            Ok(())
        }
    }
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}

fn cmd_open(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let owner = args.first().ok_or_else(|| usage("open <owner>"))?;
    context.manager.open_or_create(owner)?;
    output::success(format!("Workspace `{owner}` opened."));
    Ok(())
}

fn cmd_save(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.manager.save()?;
    output::success("Workspace saved.");
    Ok(())
}

fn cmd_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let note = if args.is_empty() {
        None
    } else {
        Some(args.join(" "))
    };
    context.manager.backup(note.as_deref())?;
    output::success("Backup created.");
    Ok(())
}

fn cmd_backups(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let owner = context
        .manager
        .current_owner()
        .ok_or(CommandError::WorkspaceNotLoaded)?
        .to_string();
    let backups = context.manager.list_backups(&owner)?;
    if backups.is_empty() {
        output::warning("No backups available.");
        return Ok(());
    }
    output::section("Backups");
    for (idx, name) in backups.iter().enumerate() {
        output::info(format!("  {:>2}. {}", idx + 1, name));
    }
    Ok(())
}

fn cmd_restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let backup_name = args.first().ok_or_else(|| usage("restore <backup-name>"))?;
    let owner = context
        .manager
        .current_owner()
        .ok_or(CommandError::WorkspaceNotLoaded)?
        .to_string();
    if !context.confirm(&format!("Restore `{owner}` from backup `{backup_name}`?"))? {
        output::info("Operation cancelled.");
        return Ok(());
    }
    context.manager.restore_backup(&owner, backup_name)?;
    output::success(format!("Workspace restored from `{backup_name}`."));
    Ok(())
}

fn cmd_account(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first().copied() {
        Some("add") => {
            let name = args.get(1).ok_or_else(|| {
                usage("account add <name> <kind> [balance]")
            })?;
            let kind = args
                .get(2)
                .map(|raw| AccountKind::parse(raw))
                .unwrap_or(AccountKind::Other);
            let balance = match args.get(3) {
                Some(raw) => parse_amount(raw)?,
                None => 0.0,
            };
            AccountService::create(context.workspace_mut()?, name, kind, balance)?;
            context.manager.commit(&[Collection::Accounts])?;
            output::success(format!("Account `{name}` added."));
            Ok(())
        }
        Some("list") => {
            let workspace = context.workspace()?;
            if workspace.accounts.is_empty() {
                output::warning("No accounts yet.");
                return Ok(());
            }
            output::section("Accounts");
            let rows: Vec<String> = AccountService::list(workspace)
                .iter()
                .map(|account| {
                    format!(
                        "  {:<24} {:<12} {}",
                        account.name,
                        account.kind.to_string(),
                        context.amount(account.balance)
                    )
                })
                .collect();
            for row in rows {
                output::info(row);
            }
            Ok(())
        }
        Some("balance") => {
            let name = args
                .get(1)
                .ok_or_else(|| usage("account balance <name> <amount>"))?;
            let amount = parse_amount(
                args.get(2)
                    .ok_or_else(|| usage("account balance <name> <amount>"))?,
            )?;
            let id = account_id_by_name(context, name)?;
            AccountService::set_balance(context.workspace_mut()?, id, amount)?;
            context.manager.commit(&[Collection::Accounts])?;
            output::success(format!("Account `{name}` balance set."));
            Ok(())
        }
        Some("remove") => {
            let name = args.get(1).ok_or_else(|| usage("account remove <name>"))?;
            if !context.confirm(&format!("Remove account `{name}`?"))? {
                output::info("Operation cancelled.");
                return Ok(());
            }
            let id = account_id_by_name(context, name)?;
            AccountService::remove(context.workspace_mut()?, id)?;
            context.manager.commit(&[Collection::Accounts])?;
            output::success(format!("Account `{name}` removed."));
            Ok(())
        }
        _ => Err(usage("account <add|list|balance|remove> ...")),
    }
}

fn cmd_debt(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first().copied() {
        Some("add") => {
            let name = args
                .get(1)
                .ok_or_else(|| usage("debt add <name> <amount> [loan]"))?;
            let amount = parse_amount(
                args.get(2)
                    .ok_or_else(|| usage("debt add <name> <amount> [loan]"))?,
            )?;
            let is_debt = !matches!(args.get(3).copied(), Some("loan"));
            DebtService::create(context.workspace_mut()?, name, amount, is_debt)?;
            context.manager.commit(&[Collection::Debts])?;
            output::success(format!("Debt `{name}` added."));
            Ok(())
        }
        Some("list") => {
            let workspace = context.workspace()?;
            if workspace.debts.is_empty() {
                output::warning("No debts yet.");
                return Ok(());
            }
            output::section("Debts");
            let rows: Vec<String> = DebtService::list(workspace)
                .iter()
                .map(|debt| {
                    let direction = if debt.is_debt { "owed" } else { "loaned" };
                    format!(
                        "  {:<24} {:<10} {:<8} {}",
                        debt.name,
                        context.amount(debt.amount),
                        direction,
                        debt.status
                    )
                })
                .collect();
            for row in rows {
                output::info(row);
            }
            Ok(())
        }
        Some("status") => {
            let name = args
                .get(1)
                .ok_or_else(|| usage("debt status <name> <status>"))?;
            let raw_status = args[2..].join(" ");
            let status = DebtStatus::parse(&raw_status).ok_or_else(|| {
                CommandError::InvalidArguments(format!("`{raw_status}` is not a debt status"))
            })?;
            let id = debt_id_by_name(context, name)?;
            DebtService::set_status(context.workspace_mut()?, id, status)?;
            context.manager.commit(&[Collection::Debts])?;
            output::success(format!("Debt `{name}` status updated."));
            Ok(())
        }
        Some("due") => {
            let name = args
                .get(1)
                .ok_or_else(|| usage("debt due <name> <YYYY-MM-DD>"))?;
            let date = parse_date(
                args.get(2)
                    .ok_or_else(|| usage("debt due <name> <YYYY-MM-DD>"))?,
            )?;
            let id = debt_id_by_name(context, name)?;
            DebtService::set_due_date(context.workspace_mut()?, id, Some(date))?;
            context.manager.commit(&[Collection::Debts])?;
            output::success(format!("Debt `{name}` due date set."));
            Ok(())
        }
        Some("remove") => {
            let name = args.get(1).ok_or_else(|| usage("debt remove <name>"))?;
            if !context.confirm(&format!("Remove debt `{name}`?"))? {
                output::info("Operation cancelled.");
                return Ok(());
            }
            let id = debt_id_by_name(context, name)?;
            DebtService::remove(context.workspace_mut()?, id)?;
            context.manager.commit(&[Collection::Debts])?;
            output::success(format!("Debt `{name}` removed."));
            Ok(())
        }
        _ => Err(usage("debt <add|list|status|due|remove> ...")),
    }
}

fn cmd_category(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first().copied() {
        Some("add") => {
            let name = args
                .get(1)
                .ok_or_else(|| usage("category add <name> [color]"))?;
            let color = args.get(2).map(|raw| raw.to_string());
            CategoryService::create_with_color(context.workspace_mut()?, name, color)?;
            context.manager.commit(&[Collection::Categories])?;
            output::success(format!("Category `{name}` added."));
            Ok(())
        }
        Some("list") => {
            let workspace = context.workspace()?;
            if workspace.categories.is_empty() {
                output::warning("No categories yet.");
                return Ok(());
            }
            output::section("Categories");
            for category in CategoryService::list(workspace) {
                output::info(format!("  {:<24} {}", category.name, category.color));
            }
            Ok(())
        }
        Some("rename") => {
            let old = args
                .get(1)
                .ok_or_else(|| usage("category rename <old> <new>"))?;
            let new = args
                .get(2)
                .ok_or_else(|| usage("category rename <old> <new>"))?;
            let id = category_id_by_name(context, old)?;
            let rewritten = CategoryService::rename(context.workspace_mut()?, id, new)?;
            context
                .manager
                .commit(&[Collection::Categories, Collection::Expenses])?;
            output::success(format!(
                "Category `{old}` renamed to `{new}` ({rewritten} entries updated)."
            ));
            Ok(())
        }
        Some("remove") => {
            let name = args.get(1).ok_or_else(|| usage("category remove <name>"))?;
            if !context.confirm(&format!(
                "Remove category `{name}` and its expense entries?"
            ))? {
                output::info("Operation cancelled.");
                return Ok(());
            }
            let id = category_id_by_name(context, name)?;
            let removal = CategoryService::remove(context.workspace_mut()?, id)?;
            context
                .manager
                .commit(&[Collection::Categories, Collection::Expenses])?;
            output::success(format!(
                "Category `{name}` removed ({} entries removed with it).",
                removal.removed_entries.len()
            ));
            Ok(())
        }
        _ => Err(usage("category <add|list|rename|remove> ...")),
    }
}

fn cmd_expense(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first().copied() {
        Some("add") => {
            let name = args
                .get(1)
                .ok_or_else(|| usage("expense add <name> <amount> <target> [YYYY-MM-DD]"))?;
            let amount = parse_amount(args.get(2).ok_or_else(|| {
                usage("expense add <name> <amount> <target> [YYYY-MM-DD]")
            })?)?;
            let label = args.get(3).ok_or_else(|| {
                usage("expense add <name> <amount> <target> [YYYY-MM-DD]")
            })?;
            let date = match args.get(4) {
                Some(raw) => Some(midnight_utc(parse_date(raw)?)),
                None => None,
            };
            let target = AllocationService::target_from_label(context.workspace()?, label);
            let collections = entry_collections(&target);
            let mut draft = AllocationDraft::new(name.to_string(), amount, target);
            draft.date = date;
            let outcome = AllocationService::record(context.workspace_mut()?, draft)?;
            context.manager.commit(&collections)?;
            report_mirror_warnings(&outcome);
            output::success(format!("Entry `{name}` recorded."));
            Ok(())
        }
        Some("list") => {
            let filter = EntryFilter {
                from: match args.get(1) {
                    Some(raw) => Some(parse_date(raw)?),
                    None => None,
                },
                to: match args.get(2) {
                    Some(raw) => Some(parse_date(raw)?),
                    None => None,
                },
                target: None,
            };
            let workspace = context.workspace()?;
            let entries = AllocationService::list_filtered(workspace, &filter);
            if entries.is_empty() {
                output::warning("No expense entries found.");
                return Ok(());
            }
            output::section("Expense entries");
            let rows: Vec<String> = entries
                .iter()
                .enumerate()
                .map(|(idx, entry)| {
                    format!(
                        "  {:>3}. {:<24} {:<10} {:<28} {}",
                        idx + 1,
                        entry.name,
                        context.amount(entry.amount),
                        workspace.target_label(&entry.target),
                        entry.date.format("%Y-%m-%d")
                    )
                })
                .collect();
            for row in rows {
                output::info(row);
            }
            Ok(())
        }
        Some("edit") => {
            let index = parse_index(args.get(1), "expense edit <index> <name> <amount> <target>")?;
            let name = args
                .get(2)
                .ok_or_else(|| usage("expense edit <index> <name> <amount> <target>"))?;
            let amount = parse_amount(args.get(3).ok_or_else(|| {
                usage("expense edit <index> <name> <amount> <target>")
            })?)?;
            let label = args.get(4).ok_or_else(|| {
                usage("expense edit <index> <name> <amount> <target>")
            })?;
            let (id, old_target) = expense_at(context, index)?;
            let target = AllocationService::target_from_label(context.workspace()?, label);
            let mut collections = entry_collections(&old_target);
            for collection in entry_collections(&target) {
                if !collections.contains(&collection) {
                    collections.push(collection);
                }
            }
            let notes = context
                .workspace()?
                .expense(id)
                .and_then(|entry| entry.notes.clone());
            let outcome = AllocationService::revise(
                context.workspace_mut()?,
                id,
                AllocationUpdate {
                    name: name.to_string(),
                    amount,
                    target,
                    notes,
                },
            )?;
            context.manager.commit(&collections)?;
            report_mirror_warnings(&outcome);
            output::success(format!("Entry `{name}` updated."));
            Ok(())
        }
        Some("remove") => {
            let index = parse_index(args.get(1), "expense remove <index>")?;
            let (id, target) = expense_at(context, index)?;
            if !context.confirm("Remove this expense entry?")? {
                output::info("Operation cancelled.");
                return Ok(());
            }
            let collections = entry_collections(&target);
            let outcome = AllocationService::retract(context.workspace_mut()?, id)?;
            context.manager.commit(&collections)?;
            report_mirror_warnings(&outcome);
            output::success("Entry removed.");
            Ok(())
        }
        _ => Err(usage("expense <add|list|edit|remove> ...")),
    }
}

fn cmd_transfer(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first().copied() {
        Some("add") => {
            let from = args
                .get(1)
                .ok_or_else(|| usage("transfer add <from> <to> <amount> [YYYY-MM-DD]"))?;
            let to = args
                .get(2)
                .ok_or_else(|| usage("transfer add <from> <to> <amount> [YYYY-MM-DD]"))?;
            let amount = parse_amount(args.get(3).ok_or_else(|| {
                usage("transfer add <from> <to> <amount> [YYYY-MM-DD]")
            })?)?;
            let date = match args.get(4) {
                Some(raw) => parse_date(raw)?,
                None => Utc::now().date_naive(),
            };
            let draft = TransferDraft {
                from_account: account_id_by_name(context, from)?,
                to_account: account_id_by_name(context, to)?,
                amount,
                date,
                description: None,
            };
            TransferService::record(context.workspace_mut()?, draft)?;
            context
                .manager
                .commit(&[Collection::Transfers, Collection::Accounts])?;
            output::success(format!("Transferred {} from `{from}` to `{to}`.", context.amount(amount)));
            Ok(())
        }
        Some("list") => {
            let workspace = context.workspace()?;
            if workspace.transfers.is_empty() {
                output::warning("No transfers yet.");
                return Ok(());
            }
            output::section("Transfers");
            let rows: Vec<String> = TransferService::list(workspace)
                .iter()
                .enumerate()
                .map(|(idx, transfer)| {
                    let from = workspace
                        .account(transfer.from_account)
                        .map(|account| account.name.clone())
                        .unwrap_or_else(|| transfer.from_account.to_string());
                    let to = workspace
                        .account(transfer.to_account)
                        .map(|account| account.name.clone())
                        .unwrap_or_else(|| transfer.to_account.to_string());
                    format!(
                        "  {:>3}. {} -> {} {} on {}",
                        idx + 1,
                        from,
                        to,
                        context.amount(transfer.amount),
                        transfer.date
                    )
                })
                .collect();
            for row in rows {
                output::info(row);
            }
            Ok(())
        }
        Some("remove") => {
            let index = parse_index(args.get(1), "transfer remove <index>")?;
            let id = {
                let workspace = context.workspace()?;
                TransferService::list(workspace)
                    .get(index)
                    .map(|transfer| transfer.id)
                    .ok_or_else(|| {
                        CommandError::InvalidArguments("transfer index out of range".into())
                    })?
            };
            if !context.confirm("Remove this transfer and reverse it?")? {
                output::info("Operation cancelled.");
                return Ok(());
            }
            TransferService::remove(context.workspace_mut()?, id)?;
            context
                .manager
                .commit(&[Collection::Transfers, Collection::Accounts])?;
            output::success("Transfer removed.");
            Ok(())
        }
        _ => Err(usage("transfer <add|list|remove> ...")),
    }
}

fn cmd_budget(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first().copied() {
        Some("add") => {
            let account = args
                .get(1)
                .ok_or_else(|| usage("budget add <account> <amount> <YYYY-MM>"))?;
            let amount = parse_amount(args.get(2).ok_or_else(|| {
                usage("budget add <account> <amount> <YYYY-MM>")
            })?)?;
            let month = args.get(3).ok_or_else(|| {
                usage("budget add <account> <amount> <YYYY-MM>")
            })?;
            let account_id = account_id_by_name(context, account)?;
            BudgetService::create(context.workspace_mut()?, account_id, amount, month, None)?;
            context.manager.commit(&[Collection::BudgetAllocations])?;
            output::success(format!("Budget allocation for `{account}` in {month} added."));
            Ok(())
        }
        Some("list") => {
            let month = args.get(1).copied();
            let workspace = context.workspace()?;
            let allocations = BudgetService::list(workspace, month);
            if allocations.is_empty() {
                output::warning("No budget allocations found.");
                return Ok(());
            }
            output::section("Budget allocations");
            let rows: Vec<String> = allocations
                .iter()
                .enumerate()
                .map(|(idx, allocation)| {
                    let account = workspace
                        .account(allocation.account_id)
                        .map(|account| account.name.clone())
                        .unwrap_or_else(|| allocation.account_id.to_string());
                    format!(
                        "  {:>3}. {:<24} {:<10} {}",
                        idx + 1,
                        account,
                        context.amount(allocation.amount),
                        allocation.month
                    )
                })
                .collect();
            for row in rows {
                output::info(row);
            }
            Ok(())
        }
        Some("remove") => {
            let index = parse_index(args.get(1), "budget remove <index>")?;
            let id = {
                let workspace = context.workspace()?;
                BudgetService::list(workspace, None)
                    .get(index)
                    .map(|allocation| allocation.id)
                    .ok_or_else(|| {
                        CommandError::InvalidArguments("budget index out of range".into())
                    })?
            };
            BudgetService::remove(context.workspace_mut()?, id)?;
            context.manager.commit(&[Collection::BudgetAllocations])?;
            output::success("Budget allocation removed.");
            Ok(())
        }
        _ => Err(usage("budget <add|list|remove> ...")),
    }
}

fn cmd_report(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first().copied() {
        Some("create") => {
            let kind = match args.get(1) {
                Some(raw) => ReportKind::parse(raw).ok_or_else(|| {
                    CommandError::InvalidArguments(format!("`{raw}` is not a report kind"))
                })?,
                None => ReportKind::Monthly,
            };
            let name = if args.len() > 2 {
                Some(args[2..].join(" "))
            } else {
                None
            };
            let id = ReportService::create(context.workspace_mut()?, kind, name)?;
            context.manager.commit(&[Collection::Reports])?;
            let report_name = context
                .workspace()?
                .report(id)
                .map(|report| report.name.clone())
                .unwrap_or_default();
            output::success(format!("Report `{report_name}` created."));
            Ok(())
        }
        Some("list") => {
            let filter = ReportFilter {
                start_month: args.get(1).map(|raw| raw.to_string()),
                end_month: args.get(2).map(|raw| raw.to_string()),
                kind: match args.get(3) {
                    Some(raw) => Some(ReportKind::parse(raw).ok_or_else(|| {
                        CommandError::InvalidArguments(format!("`{raw}` is not a report kind"))
                    })?),
                    None => None,
                },
            };
            let workspace = context.workspace()?;
            let reports = ReportService::list(workspace, &filter)?;
            if reports.is_empty() {
                output::warning("No reports found.");
                return Ok(());
            }
            output::section("Reports");
            let rows: Vec<String> = reports
                .iter()
                .enumerate()
                .map(|(idx, report)| {
                    format!(
                        "  {:>3}. {:<32} {:<10} {} (net worth {})",
                        idx + 1,
                        report.name,
                        report.kind,
                        report.month,
                        context.amount(report.totals.net_worth)
                    )
                })
                .collect();
            for row in rows {
                output::info(row);
            }
            Ok(())
        }
        Some("show") => {
            let workspace = context.workspace()?;
            let report = match args.get(1).copied() {
                Some("latest") | None => ReportService::latest(workspace).ok_or_else(|| {
                    CommandError::InvalidArguments("no reports available".into())
                })?,
                Some(raw) => {
                    let index = parse_index(Some(&raw), "report show <index|latest>")?;
                    *ReportService::list(workspace, &ReportFilter::default())?
                        .get(index)
                        .ok_or_else(|| {
                            CommandError::InvalidArguments("report index out of range".into())
                        })?
                }
            };
            output::section(&report.name);
            output::info(format!("Month: {}  Kind: {}", report.month, report.kind));
            output::info(format!(
                "Assets: {}  Debts: {}  Loans: {}",
                context.amount(report.totals.total_assets),
                context.amount(report.totals.total_debts),
                context.amount(report.totals.total_loans)
            ));
            output::info(format!(
                "Net worth: {}  Monthly expenses: {}",
                context.amount(report.totals.net_worth),
                context.amount(report.totals.monthly_expenses)
            ));
            if !report.expenses_by_category.is_empty() {
                output::info("By category:");
                for (label, total) in &report.expenses_by_category {
                    output::info(format!("  {:<28} {}", label, context.amount(*total)));
                }
            }
            Ok(())
        }
        Some("remove") => {
            let index = parse_index(args.get(1), "report remove <index>")?;
            let id = {
                let workspace = context.workspace()?;
                ReportService::list(workspace, &ReportFilter::default())?
                    .get(index)
                    .map(|report| report.id)
                    .ok_or_else(|| {
                        CommandError::InvalidArguments("report index out of range".into())
                    })?
            };
            if !context.confirm("Remove this report?")? {
                output::info("Operation cancelled.");
                return Ok(());
            }
            ReportService::remove(context.workspace_mut()?, id)?;
            context.manager.commit(&[Collection::Reports])?;
            output::success("Report removed.");
            Ok(())
        }
        _ => Err(usage("report <create|list|show|remove> ...")),
    }
}

fn cmd_summary(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let months = match args.first() {
        Some(raw) => raw.parse::<usize>().map_err(|_| {
            CommandError::InvalidArguments("months must be a positive number".into())
        })?,
        None => 6,
    };
    let workspace = context.workspace()?;
    let today = Utc::now().date_naive();

    let breakdown = aggregates::net_worth_breakdown(&workspace.accounts, &workspace.debts);
    output::section("Net worth");
    output::info(format!(
        "Assets: {}  Debts: {}  Loans: {}",
        context.amount(breakdown.total_assets),
        context.amount(breakdown.total_debts),
        context.amount(breakdown.total_loans)
    ));
    output::info(format!("Net worth: {}", context.amount(breakdown.net_worth)));

    output::section("Monthly spending");
    for bucket in aggregates::monthly_rollup(&workspace.expenses, months, today) {
        output::info(format!(
            "  {}  {:<12} ({} entries)",
            bucket.month,
            context.amount(bucket.total),
            bucket.count
        ));
    }
    Ok(())
}

fn cmd_warnings(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let warnings = workspace_warnings(context.workspace()?);
    if warnings.is_empty() {
        output::success("No integrity warnings.");
        return Ok(());
    }
    output::section("Integrity warnings");
    for warning in warnings {
        output::warning(warning);
    }
    Ok(())
}

fn parse_index(arg: Option<&&str>, usage_text: &str) -> Result<usize, CommandError> {
    let raw = arg.ok_or_else(|| usage(usage_text))?;
    let index = raw
        .parse::<usize>()
        .map_err(|_| CommandError::InvalidArguments("index must be numeric".into()))?;
    if index == 0 {
        return Err(CommandError::InvalidArguments(
            "indexes start at 1".into(),
        ));
    }
    Ok(index - 1)
}

fn expense_at(
    context: &ShellContext,
    index: usize,
) -> Result<(Uuid, AllocationTarget), CommandError> {
    let workspace = context.workspace()?;
    AllocationService::list(workspace)
        .get(index)
        .map(|entry| (entry.id, entry.target.clone()))
        .ok_or_else(|| CommandError::InvalidArguments("expense index out of range".into()))
}
