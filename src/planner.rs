use crate::calc::{
    aggregate, compute_budget, round_off_2_decimal, validate_total_weight, Budget, Category,
    GradeAggregate, Item, LetterGrade,
};
use crate::config::PlannerConfig;
use crate::engine::{
    self, allocate, collect_ungraded_slots, projected_grade, EditOutcome, EngineError, Strategy,
    UngradedSlot,
};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlannerError {
    #[error("category not found: {0}")]
    CategoryNotFound(i64),
    #[error("item {index} not found in category {category_id}")]
    ItemNotFound { category_id: i64, index: usize },
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl PlannerError {
    pub fn code(&self) -> &'static str {
        match self {
            PlannerError::CategoryNotFound(_) | PlannerError::ItemNotFound { .. } => "not_found",
            PlannerError::Invalid(_) => "bad_params",
            PlannerError::Engine(e) => e.code(),
        }
    }
}

fn validate_name(what: &str, name: &str) -> Result<String, PlannerError> {
    let t = name.trim();
    if t.is_empty() {
        return Err(PlannerError::Invalid(format!("{} name is required", what)));
    }
    if t.chars().count() > MAX_NAME_LEN {
        return Err(PlannerError::Invalid(format!(
            "{} name is too long (max {} characters)",
            what, MAX_NAME_LEN
        )));
    }
    Ok(t.to_string())
}

fn validate_weight(weight: f64) -> Result<f64, PlannerError> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(PlannerError::Invalid(
            "category weight cannot be negative".to_string(),
        ));
    }
    if weight > 100.0 {
        return Err(PlannerError::Invalid(
            "category weight cannot exceed 100%".to_string(),
        ));
    }
    Ok(weight)
}

fn validate_score(score: Option<f64>) -> Result<Option<f64>, PlannerError> {
    match score {
        Some(s) if !s.is_finite() || s < 0.0 => Err(PlannerError::Invalid(
            "score cannot be negative".to_string(),
        )),
        Some(s) if s > 100.0 => Err(PlannerError::Invalid(
            "score cannot exceed 100%".to_string(),
        )),
        other => Ok(other),
    }
}

fn check_unique_item_name(cat: &Category, name: &str, skip: Option<usize>) -> Result<(), PlannerError> {
    let taken = cat
        .items
        .iter()
        .enumerate()
        .any(|(i, item)| Some(i) != skip && item.name == name);
    if taken {
        return Err(PlannerError::Invalid(format!(
            "item name \"{}\" is already used in {}",
            name, cat.name
        )));
    }
    Ok(())
}

/// First `Item N` not already taken in the category.
fn next_item_name(cat: &Category) -> String {
    (1_usize..)
        .map(|n| format!("Item {}", n))
        .find(|candidate| cat.items.iter().all(|item| &item.name != candidate))
        .unwrap_or_default()
}

/// Partial update for one item. `score: Some(None)` marks the item ungraded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub score: Option<Option<f64>>,
    pub is_attendance: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub required: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryIssue {
    pub category_id: i64,
    pub name: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupValidation {
    pub valid: bool,
    pub total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub category_issues: Vec<CategoryIssue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanReport {
    pub target: LetterGrade,
    pub target_percent: f64,
    pub strategy: Strategy,
    pub aggregate: GradeAggregate,
    pub budget: Budget,
    pub total_deductible_points: f64,
    /// Every slot's deduction, pinned ones included.
    pub total_deducted: f64,
    pub pinned_deducted: f64,
    pub within_budget: bool,
    pub projected_grade: f64,
    pub projected_letter: LetterGrade,
    pub attendance: AttendanceSummary,
    pub slots: Vec<UngradedSlot>,
}

/// Everything the planner knows about one course. Every mutation that
/// changes categories, target or strategy runs a full recompute.
#[derive(Debug, Clone)]
pub struct PlannerState {
    categories: Vec<Category>,
    next_category_id: i64,
    target: LetterGrade,
    strategy: Strategy,
    slots: Vec<UngradedSlot>,
    aggregate: GradeAggregate,
    budget: Budget,
    attendance_keywords: Vec<String>,
}

impl PlannerState {
    pub fn new(cfg: &PlannerConfig) -> Self {
        let mut state = Self {
            categories: Vec::new(),
            next_category_id: 1,
            target: cfg.default_target,
            strategy: cfg.default_strategy,
            slots: Vec::new(),
            aggregate: GradeAggregate::default(),
            budget: compute_budget(0.0, cfg.default_target.threshold()),
            attendance_keywords: cfg.attendance_keywords.clone(),
        };
        state.recompute();
        state
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn slots(&self) -> &[UngradedSlot] {
        &self.slots
    }

    pub fn target(&self) -> LetterGrade {
        self.target
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn aggregate(&self) -> GradeAggregate {
        self.aggregate
    }

    pub fn budget(&self) -> Budget {
        self.budget
    }

    pub fn projected_grade(&self) -> f64 {
        round_off_2_decimal(projected_grade(&self.categories, &self.slots))
    }

    /// Aggregate, budget, slot rebuild and allocation, in that order.
    pub fn recompute(&mut self) {
        self.aggregate = aggregate(&self.categories);
        self.budget = compute_budget(self.aggregate.max, self.target.threshold());
        let fresh = collect_ungraded_slots(&self.categories, &self.slots, &self.attendance_keywords);
        self.slots = allocate(self.strategy, &fresh, self.budget.deductible());
        if !self.budget.has_slack() && !self.slots.is_empty() {
            info!(
                max_possible = self.budget.max_possible,
                achievable = self.budget.achievable,
                "no slack, every slot needs full marks"
            );
        }
        info!(
            target_grade = self.target.as_str(),
            strategy = self.strategy.as_str(),
            slots = self.slots.len(),
            deductible = self.budget.deductible(),
            achievable = self.budget.achievable,
            "planner recomputed"
        );
    }

    pub fn reset(&mut self) {
        self.categories.clear();
        self.slots.clear();
        self.next_category_id = 1;
        self.recompute();
    }

    pub fn set_target(&mut self, target: LetterGrade) {
        self.target = target;
        self.recompute();
    }

    pub fn set_strategy(&mut self, strategy: Strategy) {
        self.strategy = strategy;
        self.recompute();
    }

    /// Replaces every category, e.g. with data mapped from the LMS. Ids that
    /// are missing (0) or repeated are reassigned.
    pub fn set_categories(&mut self, categories: Vec<Category>) -> Result<(), PlannerError> {
        let mut next_id = categories.iter().map(|c| c.id).max().unwrap_or(0).max(0) + 1;
        let mut seen = std::collections::HashSet::new();
        let mut cleaned = Vec::with_capacity(categories.len());
        for mut cat in categories {
            cat.name = validate_name("category", &cat.name)?;
            cat.weight = validate_weight(cat.weight)?;
            let mut names = std::collections::HashSet::new();
            for item in cat.items.iter_mut() {
                item.name = validate_name("item", &item.name)?;
                item.score = validate_score(item.score)?;
                if !names.insert(item.name.clone()) {
                    return Err(PlannerError::Invalid(format!(
                        "item name \"{}\" is already used in {}",
                        item.name, cat.name
                    )));
                }
            }
            if cat.id <= 0 || !seen.insert(cat.id) {
                cat.id = next_id;
                seen.insert(next_id);
                next_id += 1;
            }
            cleaned.push(cat);
        }
        self.categories = cleaned;
        self.next_category_id = next_id;
        self.slots.clear();
        self.recompute();
        Ok(())
    }

    pub fn add_category(&mut self, name: Option<&str>, weight: Option<f64>) -> Result<i64, PlannerError> {
        let name = validate_name("category", name.unwrap_or("New Category"))?;
        let weight = validate_weight(weight.unwrap_or(0.0))?;
        let id = self.next_category_id;
        self.next_category_id += 1;
        self.categories.push(Category {
            id,
            name,
            weight,
            items: vec![Item {
                name: "Item 1".to_string(),
                score: None,
                is_attendance: false,
            }],
        });
        self.recompute();
        Ok(id)
    }

    fn category_mut(&mut self, id: i64) -> Result<&mut Category, PlannerError> {
        self.categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(PlannerError::CategoryNotFound(id))
    }

    pub fn update_category(
        &mut self,
        id: i64,
        name: Option<&str>,
        weight: Option<f64>,
    ) -> Result<(), PlannerError> {
        let name = name.map(|n| validate_name("category", n)).transpose()?;
        let weight = weight.map(validate_weight).transpose()?;
        let cat = self.category_mut(id)?;
        if let Some(n) = name {
            cat.name = n;
        }
        if let Some(w) = weight {
            cat.weight = w;
        }
        self.recompute();
        Ok(())
    }

    pub fn delete_category(&mut self, id: i64) -> Result<(), PlannerError> {
        let before = self.categories.len();
        self.categories.retain(|c| c.id != id);
        if self.categories.len() == before {
            return Err(PlannerError::CategoryNotFound(id));
        }
        self.recompute();
        Ok(())
    }

    pub fn add_item(
        &mut self,
        category_id: i64,
        name: Option<&str>,
        score: Option<f64>,
        is_attendance: bool,
    ) -> Result<usize, PlannerError> {
        let score = validate_score(score)?;
        let name = name.map(|n| validate_name("item", n)).transpose()?;
        let cat = self.category_mut(category_id)?;
        let name = match name {
            Some(n) => {
                check_unique_item_name(cat, &n, None)?;
                n
            }
            None => next_item_name(cat),
        };
        let index = cat.items.len();
        cat.items.push(Item {
            name,
            score,
            is_attendance,
        });
        self.recompute();
        Ok(index)
    }

    pub fn update_item(&mut self, category_id: i64, index: usize, patch: ItemPatch) -> Result<(), PlannerError> {
        let name = patch
            .name
            .as_deref()
            .map(|n| validate_name("item", n))
            .transpose()?;
        let score = patch.score.map(validate_score).transpose()?;
        let cat = self.category_mut(category_id)?;
        if index >= cat.items.len() {
            return Err(PlannerError::ItemNotFound { category_id, index });
        }
        if let Some(n) = &name {
            check_unique_item_name(cat, n, Some(index))?;
        }
        let item = &mut cat.items[index];
        if let Some(n) = name {
            item.name = n;
        }
        if let Some(s) = score {
            item.score = s;
        }
        if let Some(a) = patch.is_attendance {
            item.is_attendance = a;
        }
        self.recompute();
        Ok(())
    }

    pub fn delete_item(&mut self, category_id: i64, index: usize) -> Result<(), PlannerError> {
        let cat = self.category_mut(category_id)?;
        if index >= cat.items.len() {
            return Err(PlannerError::ItemNotFound { category_id, index });
        }
        cat.items.remove(index);
        self.recompute();
        Ok(())
    }

    /// Slider edit on one slot; the rest of the list is repaired in place.
    pub fn edit_slot(&mut self, index: usize, score: f64) -> Result<EditOutcome, PlannerError> {
        let res = engine::apply_edit(&self.slots, index, score, self.budget.deductible())?;
        if !res.fully_redistributed() {
            info!(index, score, "edit limited, other slots could not make room");
        }
        self.slots = res.slots;
        Ok(res.outcome)
    }

    /// Returns the new pinned state.
    pub fn toggle_pin(&mut self, index: usize) -> Result<bool, PlannerError> {
        self.slots = engine::toggle_pin(&self.slots, index)?;
        Ok(self.slots[index].is_pinned)
    }

    pub fn validate(&self) -> SetupValidation {
        let total = validate_total_weight(&self.categories);
        let category_issues = self
            .categories
            .iter()
            .filter(|c| c.items.is_empty())
            .map(|c| CategoryIssue {
                category_id: c.id,
                name: c.name.clone(),
                message: "category has no items".to_string(),
            })
            .collect();
        SetupValidation {
            valid: total.valid,
            total: total.total,
            error: total.error,
            category_issues,
        }
    }

    pub fn attendance_summary(&self) -> AttendanceSummary {
        let attendance = self.slots.iter().filter(|s| s.is_attendance);
        AttendanceSummary {
            required: attendance.clone().filter(|s| s.is_attending()).count(),
            total: attendance.count(),
        }
    }

    pub fn report(&self) -> PlanReport {
        let total_deducted: f64 = self.slots.iter().map(|s| s.deducted_points).sum();
        let pinned_deducted: f64 = self
            .slots
            .iter()
            .filter(|s| s.is_pinned)
            .map(|s| s.deducted_points)
            .sum();
        let projected = self.projected_grade();
        PlanReport {
            target: self.target,
            target_percent: self.target.threshold(),
            strategy: self.strategy,
            aggregate: self.aggregate,
            budget: self.budget,
            total_deductible_points: self.budget.deductible(),
            total_deducted,
            pinned_deducted,
            within_budget: engine::within_budget(total_deducted, self.budget.deductible()),
            projected_grade: projected,
            projected_letter: LetterGrade::from_percentage(projected),
            attendance: self.attendance_summary(),
            slots: self.slots.clone(),
        }
    }
}
