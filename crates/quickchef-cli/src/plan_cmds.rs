//! CLI handlers for the plan file commands.
//!
//! Implements:
//! - `quickchef plan <request.toml>`          -- generate (or reuse) a plan
//! - `quickchef replace <plan.json> ...`      -- swap one meal for a different one
//! - `quickchef swap <plan.json> ...`         -- regenerate a meal with ingredient swaps
//! - `quickchef reschedule <plan.json> ...`   -- move a schedule task
//! - `quickchef export <plan.json>`           -- write the schedule as iCalendar

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;

use quickchef_core::PlanCoordinator;
use quickchef_core::calendar;
use quickchef_core::model::{CookingRequest, IngredientSwap, MealPlan, MealSlot};
use quickchef_core::schedule;

// -----------------------------------------------------------------------
// File helpers
// -----------------------------------------------------------------------

/// Read a request TOML file and normalize its pantry and dislikes.
pub fn load_request(path: &Path) -> Result<CookingRequest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read request file: {}", path.display()))?;
    let request: CookingRequest = toml::from_str(&content)
        .with_context(|| format!("failed to parse request file: {}", path.display()))?;
    Ok(request.normalized())
}

pub fn load_plan(path: &Path) -> Result<MealPlan> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read plan file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse plan file: {}", path.display()))
}

/// Write to `output`, or to stdout when no path is given.
fn write_output(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{content}");
            Ok(())
        }
    }
}

fn write_plan(plan: &MealPlan, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(plan).context("failed to serialize plan")?;
    write_output(&json, output)
}

/// Convert a 1-based `--day` into a day index.
fn day_index(day: u32) -> Result<usize> {
    match day.checked_sub(1) {
        Some(index) => Ok(index as usize),
        None => bail!("--day starts at 1"),
    }
}

fn anchor_or_today(start_date: Option<NaiveDate>) -> NaiveDate {
    start_date.unwrap_or_else(|| chrono::Local::now().date_naive())
}

// -----------------------------------------------------------------------
// quickchef plan
// -----------------------------------------------------------------------

pub struct PlanArgs {
    pub request: PathBuf,
    pub output: Option<PathBuf>,
    pub ics: Option<PathBuf>,
    pub start_date: Option<NaiveDate>,
}

pub async fn run_plan(coordinator: &PlanCoordinator, args: &PlanArgs) -> Result<()> {
    let request = load_request(&args.request)?;
    let plan = coordinator
        .obtain_plan(&request)
        .await
        .context("plan generation failed")?;

    write_plan(&plan, args.output.as_deref())?;
    if let Some(ics) = &args.ics {
        let anchor = anchor_or_today(args.start_date);
        write_output(&calendar::plan_to_ics(&plan, anchor), Some(ics))?;
    }

    if let Some(output) = &args.output {
        println!("Plan written to {}", output.display());
        println!("  Days:           {}", plan.days.len());
        println!("  Grocery items:  {}", plan.grocery_list.len());
        println!("  Schedule tasks: {}", plan.schedule.len());
        println!("  Budget:         {}", plan.budget_summary.verdict);
    }
    if let Some(ics) = &args.ics {
        println!("Calendar written to {}", ics.display());
    }
    Ok(())
}

// -----------------------------------------------------------------------
// quickchef replace / swap
// -----------------------------------------------------------------------

/// Target meal inside a plan file.
pub struct MealTarget {
    pub plan: PathBuf,
    pub request: PathBuf,
    pub day: u32,
    pub slot: MealSlot,
    pub output: Option<PathBuf>,
}

pub async fn run_replace(
    coordinator: &PlanCoordinator,
    target: &MealTarget,
    criteria: &str,
) -> Result<()> {
    let mut plan = load_plan(&target.plan)?;
    let request = load_request(&target.request)?;
    let index = day_index(target.day)?;
    let original = plan.meal_at(index, target.slot)?.clone();

    let replacement = coordinator
        .replace_meal(&original, criteria, &request)
        .await
        .context("meal replacement failed")?;
    let name = replacement.name.clone();
    plan.splice_meal(index, target.slot, replacement)?;

    write_plan(&plan, target.output.as_deref())?;
    eprintln!(
        "Replaced day {} {}: {} -> {}",
        target.day, target.slot, original.name, name
    );
    Ok(())
}

pub async fn run_swap(
    coordinator: &PlanCoordinator,
    target: &MealTarget,
    swaps: &[String],
) -> Result<()> {
    let mut plan = load_plan(&target.plan)?;
    let request = load_request(&target.request)?;
    let index = day_index(target.day)?;
    let original = plan.meal_at(index, target.slot)?.clone();
    let swaps: Vec<IngredientSwap> = swaps.iter().map(|s| IngredientSwap::parse(s)).collect();

    let updated = coordinator
        .swap_ingredients(&original, &swaps, &request)
        .await
        .context("ingredient swap failed")?;
    plan.splice_meal(index, target.slot, updated)?;

    write_plan(&plan, target.output.as_deref())?;
    eprintln!(
        "Swapped {} ingredient(s) in day {} {}",
        swaps.len(),
        target.day,
        target.slot
    );
    Ok(())
}

// -----------------------------------------------------------------------
// quickchef reschedule
// -----------------------------------------------------------------------

pub fn run_reschedule(
    plan_path: &Path,
    task: &str,
    day: u32,
    time: &str,
    output: Option<&Path>,
) -> Result<()> {
    let mut plan = load_plan(plan_path)?;
    let outcome = schedule::reschedule(&mut plan, task, day, time)?;
    write_plan(&plan, output)?;

    eprintln!("Task {task} moved to day {day}, {time}.");
    if outcome.late_night {
        eprintln!("Late night cooking detected. Consider a quicker plan (effort_level = \"minimal\").");
    }
    Ok(())
}

// -----------------------------------------------------------------------
// quickchef export
// -----------------------------------------------------------------------

pub fn run_export(
    plan_path: &Path,
    output: Option<&Path>,
    start_date: Option<NaiveDate>,
) -> Result<()> {
    let plan = load_plan(plan_path)?;
    let ics = calendar::plan_to_ics(&plan, anchor_or_today(start_date));
    write_output(&ics, output)?;
    if let Some(path) = output {
        eprintln!(
            "Exported {} event(s) to {}",
            plan.schedule.len(),
            path.display()
        );
    }
    Ok(())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use quickchef_core::model::{PantryItem, Persona};
    use quickchef_test_utils::{Reply, ScriptedGenerator, sample_meal_json, sample_plan_json};

    const REQUEST_TOML: &str = r#"
persona = "student"
days = 1
dislikes = ["Okra"]

[[ingredients]]
name = " Rice "

[[ingredients]]
name = "dal"
locked = true

[[ingredients]]
name = "rice"

[[ingredients]]
name = "Onion"
"#;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn coordinator(replies: Vec<Reply>) -> (PlanCoordinator, Arc<ScriptedGenerator>) {
        let generator = Arc::new(ScriptedGenerator::new(replies));
        (PlanCoordinator::new(generator.clone()), generator)
    }

    #[test]
    fn load_request_normalizes() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = write(tmp.path(), "request.toml", REQUEST_TOML);

        let request = load_request(&path).unwrap();
        assert_eq!(request.persona, Persona::Student);
        assert_eq!(request.days, 1);
        assert_eq!(
            request.ingredients,
            vec![
                PantryItem::new("rice"),
                PantryItem::locked("dal"),
                PantryItem::new("onion")
            ]
        );
        assert_eq!(request.dislikes, vec!["okra".to_string()]);
    }

    #[test]
    fn load_request_reports_bad_tags() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = write(tmp.path(), "request.toml", "diet = \"keto\"\n");
        let err = load_request(&path).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse request file"));
    }

    #[test]
    fn day_is_one_based() {
        assert_eq!(day_index(1).unwrap(), 0);
        assert!(day_index(0).is_err());
    }

    #[tokio::test]
    async fn plan_command_writes_plan_and_calendar() {
        let tmp = tempfile::TempDir::new().unwrap();
        let request = write(tmp.path(), "request.toml", REQUEST_TOML);
        let (coordinator, generator) = coordinator(vec![Reply::json(&sample_plan_json(1))]);

        let args = PlanArgs {
            request,
            output: Some(tmp.path().join("plan.json")),
            ics: Some(tmp.path().join("plan.ics")),
            start_date: NaiveDate::from_ymd_opt(2026, 5, 1),
        };
        run_plan(&coordinator, &args).await.unwrap();
        assert_eq!(generator.calls(), 1);

        let plan = load_plan(&tmp.path().join("plan.json")).unwrap();
        assert_eq!(plan.schedule[0].id, "shop-1");
        let ics = std::fs::read_to_string(tmp.path().join("plan.ics")).unwrap();
        assert!(ics.contains("DTSTART:20260502T180000Z"));

        // Same request again is served from the coordinator cache.
        run_plan(&coordinator, &args).await.unwrap();
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn swap_command_splices_meal_in_place() {
        let tmp = tempfile::TempDir::new().unwrap();
        let request = write(tmp.path(), "request.toml", REQUEST_TOML);
        let plan_path = write(
            tmp.path(),
            "plan.json",
            &sample_plan_json(2).to_string(),
        );
        let mut swapped = sample_meal_json("ignored");
        swapped["name"] = "Chickpea Pulao".into();
        let (coordinator, generator) = coordinator(vec![Reply::json(&swapped)]);

        let target = MealTarget {
            plan: plan_path.clone(),
            request,
            day: 2,
            slot: MealSlot::Lunch,
            output: Some(plan_path.clone()),
        };
        run_swap(&coordinator, &target, &["dal=chickpeas".to_string()])
            .await
            .unwrap();

        let plan = load_plan(&plan_path).unwrap();
        let lunch = plan.meal(1, MealSlot::Lunch).unwrap();
        assert_eq!(lunch.id, "d2-lunch");
        assert_eq!(lunch.name, "Chickpea Pulao");
        assert_eq!(plan.meal(0, MealSlot::Lunch).unwrap().name, "Meal d1-lunch");
        assert!(generator.prompts()[0].contents.contains("with \"chickpeas\""));
    }

    #[tokio::test]
    async fn replace_command_rejects_missing_day() {
        let tmp = tempfile::TempDir::new().unwrap();
        let request = write(tmp.path(), "request.toml", REQUEST_TOML);
        let plan_path = write(
            tmp.path(),
            "plan.json",
            &sample_plan_json(1).to_string(),
        );
        let (coordinator, generator) = coordinator(vec![]);

        let target = MealTarget {
            plan: plan_path,
            request,
            day: 3,
            slot: MealSlot::Dinner,
            output: None,
        };
        let err = run_replace(&coordinator, &target, "").await.unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err:#}");
        assert_eq!(generator.calls(), 0);
    }

    #[test]
    fn reschedule_and_export_round_trip_through_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        let plan_path = write(
            tmp.path(),
            "plan.json",
            &sample_plan_json(2).to_string(),
        );

        run_reschedule(&plan_path, "cook-1", 2, "Day 2 @ 21:00", Some(&plan_path)).unwrap();
        let plan = load_plan(&plan_path).unwrap();
        let moved = plan.schedule.iter().find(|t| t.id == "cook-1").unwrap();
        assert_eq!(moved.day, 2);

        let ics_path = tmp.path().join("plan.ics");
        run_export(
            &plan_path,
            Some(&ics_path),
            NaiveDate::from_ymd_opt(2026, 5, 1),
        )
        .unwrap();
        let ics = std::fs::read_to_string(&ics_path).unwrap();
        assert!(ics.contains("UID:cook-1@quickchef"));
        assert!(ics.contains("DTSTART:20260503T210000Z"));
    }

    #[test]
    fn reschedule_unknown_task_fails() {
        let tmp = tempfile::TempDir::new().unwrap();
        let plan_path = write(
            tmp.path(),
            "plan.json",
            &sample_plan_json(1).to_string(),
        );
        let err = run_reschedule(&plan_path, "nope", 1, "noon", None).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}
