use uuid::Uuid;

use crate::domain::expense::{parse_label, ParsedLabel};
use crate::domain::{AllocationTarget, Category, Expense, Workspace};

use super::{ServiceError, ServiceResult};

/// Result of removing a category: the entries filed under its label are
/// removed with it and returned so callers can report the cascade.
#[derive(Debug)]
pub struct CategoryRemoval {
    pub category: Category,
    pub removed_entries: Vec<Expense>,
}

/// CRUD over expense categories. The reserved `Account: ` / `Debt: `
/// label prefixes are rejected here so plain categories can never shadow
/// mirrored targets.
pub struct CategoryService;

impl CategoryService {
    pub fn create(workspace: &mut Workspace, name: &str) -> ServiceResult<Uuid> {
        Self::create_with_color(workspace, name, None)
    }

    pub fn create_with_color(
        workspace: &mut Workspace,
        name: &str,
        color: Option<String>,
    ) -> ServiceResult<Uuid> {
        let name = Self::validated_name(workspace, name, None)?;
        let category = match color {
            Some(color) => Category::new(name).with_color(color),
            None => Category::new(name),
        };
        Ok(workspace.add_category(category))
    }

    /// Renames a category and rewrites every entry filed under the old
    /// label so the grouping follows the name.
    pub fn rename(workspace: &mut Workspace, id: Uuid, new_name: &str) -> ServiceResult<usize> {
        let new_name = Self::validated_name(workspace, new_name, Some(id))?;
        let old_name = workspace
            .category(id)
            .map(|category| category.name.clone())
            .ok_or_else(|| ServiceError::Invalid("Category not found".into()))?;

        let mut rewritten = 0;
        for entry in workspace.expenses.iter_mut() {
            if entry.target.category_name() == Some(old_name.as_str()) {
                entry.target = AllocationTarget::Category(new_name.clone());
                rewritten += 1;
            }
        }
        if let Some(category) = workspace.category_mut(id) {
            category.name = new_name;
        }
        workspace.touch();
        Ok(rewritten)
    }

    pub fn set_color(workspace: &mut Workspace, id: Uuid, color: String) -> ServiceResult<()> {
        let category = workspace
            .category_mut(id)
            .ok_or_else(|| ServiceError::Invalid("Category not found".into()))?;
        category.color = color;
        workspace.touch();
        Ok(())
    }

    /// Removes a category together with the entries filed under its label.
    /// Those entries are plain by construction, so no mirror reversal is
    /// needed.
    pub fn remove(workspace: &mut Workspace, id: Uuid) -> ServiceResult<CategoryRemoval> {
        let index = workspace
            .categories
            .iter()
            .position(|category| category.id == id)
            .ok_or_else(|| ServiceError::Invalid("Category not found".into()))?;
        let category = workspace.categories.remove(index);

        let mut removed_entries = Vec::new();
        let mut kept = Vec::with_capacity(workspace.expenses.len());
        for entry in workspace.expenses.drain(..) {
            if entry.target.category_name() == Some(category.name.as_str()) {
                removed_entries.push(entry);
            } else {
                kept.push(entry);
            }
        }
        workspace.expenses = kept;
        if !removed_entries.is_empty() {
            tracing::info!(
                category = %category.name,
                entries = removed_entries.len(),
                "removed category and its entries"
            );
        }
        workspace.touch();
        Ok(CategoryRemoval {
            category,
            removed_entries,
        })
    }

    /// Categories in name order for display.
    pub fn list(workspace: &Workspace) -> Vec<&Category> {
        let mut categories: Vec<&Category> = workspace.categories.iter().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        categories
    }

    fn validated_name(
        workspace: &Workspace,
        name: &str,
        allow_id: Option<Uuid>,
    ) -> ServiceResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::Invalid(
                "Category name must not be empty".into(),
            ));
        }
        if !matches!(parse_label(name), ParsedLabel::Category(_)) {
            return Err(ServiceError::Invalid(format!(
                "'{name}' uses a reserved label prefix"
            )));
        }
        if workspace
            .category_by_name(name)
            .is_some_and(|existing| Some(existing.id) != allow_id)
        {
            return Err(ServiceError::Invalid(format!(
                "A category named '{name}' already exists"
            )));
        }
        Ok(name.to_string())
    }
}
