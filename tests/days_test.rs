mod common;

use anyhow::Result;
use caixa::Repository;
use caixa::application::RefreshTarget;
use common::{date, test_service};
use tempfile::TempDir;

#[tokio::test]
async fn test_open_day_creates_open_row() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let outcome = service.open_day(date("2024-01-01")).await;
    assert!(outcome.success);
    assert!(outcome.message.is_none());

    let day = service.get_sales_day(date("2024-01-01")).await?.unwrap();
    assert_eq!(day.date, date("2024-01-01"));
    assert!(day.open);

    Ok(())
}

#[tokio::test]
async fn test_open_day_is_idempotent() -> Result<()> {
    let (service, _temp) = test_service().await?;

    assert!(service.open_day(date("2024-01-01")).await.success);
    assert!(service.open_day(date("2024-01-01")).await.success);

    // No duplicate row was created.
    let days = service.repository().paged_complete_sales_days(10, 0).await?;
    assert_eq!(days.len(), 1);
    assert!(days[0].day.open);

    Ok(())
}

#[tokio::test]
async fn test_opening_a_day_closes_all_others() -> Result<()> {
    let (service, _temp) = test_service().await?;

    assert!(service.open_day(date("2024-01-01")).await.success);
    assert!(service.open_day(date("2024-01-02")).await.success);

    let first = service.get_sales_day(date("2024-01-01")).await?.unwrap();
    assert!(!first.open, "only the most recent day stays open");

    let second = service.get_sales_day(date("2024-01-02")).await?.unwrap();
    assert!(second.open);

    Ok(())
}

#[tokio::test]
async fn test_get_absent_day_returns_none() -> Result<()> {
    let (service, _temp) = test_service().await?;

    assert!(service.get_sales_day(date("2024-06-15")).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_day_paging_is_date_descending() -> Result<()> {
    let (service, _temp) = test_service().await?;

    for day in ["2024-01-03", "2024-01-01", "2024-01-02"] {
        assert!(service.open_day(date(day)).await.success);
    }

    let days = service.repository().paged_complete_sales_days(10, 0).await?;
    let dates: Vec<String> = days.iter().map(|d| d.day.date.to_string()).collect();
    assert_eq!(dates, ["2024-01-03", "2024-01-02", "2024-01-01"]);

    Ok(())
}

#[tokio::test]
async fn test_day_page_count_is_ceiling() -> Result<()> {
    let (service, _temp) = test_service().await?;

    for n in 1..=11 {
        assert!(service.open_day(date(&format!("2024-03-{n:02}"))).await.success);
    }

    let repo = service.repository();
    assert_eq!(repo.sales_day_page_count(10).await?, 2);
    assert_eq!(repo.sales_day_page_count(11).await?, 1);
    assert_eq!(repo.sales_day_page_count(5).await?, 3);

    let first_page = repo.paged_complete_sales_days(10, 0).await?;
    assert_eq!(first_page.len(), 10);
    let second_page = repo.paged_complete_sales_days(10, 10).await?;
    assert_eq!(second_page.len(), 1);
    assert_eq!(second_page[0].day.date, date("2024-03-01"));

    Ok(())
}

#[tokio::test]
async fn test_page_count_with_non_positive_limit_is_zero() -> Result<()> {
    let (service, _temp) = test_service().await?;

    assert!(service.open_day(date("2024-01-01")).await.success);
    assert!(service.record_entry(date("2024-01-01"), 100).await.success);

    let repo = service.repository();
    assert_eq!(repo.sales_day_page_count(0).await?, 0);
    assert_eq!(repo.sales_day_page_count(-1).await?, 0);
    assert_eq!(repo.sales_entries_page_count(date("2024-01-01"), 0).await?, 0);
    assert_eq!(repo.sales_entries_page_count(date("2024-01-01"), -3).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_empty_day_appears_with_zeroed_stats() -> Result<()> {
    let (service, _temp) = test_service().await?;

    assert!(service.open_day(date("2024-01-01")).await.success);

    let days = service.repository().paged_complete_sales_days(10, 0).await?;
    assert_eq!(days.len(), 1);
    assert_eq!(days[0].stats.count, 0);
    assert_eq!(days[0].stats.income, 0);
    assert_eq!(days[0].stats.outcome, 0);
    assert_eq!(days[0].stats.balance, 0);

    Ok(())
}

#[tokio::test]
async fn test_open_day_emits_day_list_refresh() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let mut refresh = service.subscribe();

    assert!(service.open_day(date("2024-01-01")).await.success);
    assert_eq!(refresh.recv().await?, RefreshTarget::DayList);

    Ok(())
}

#[tokio::test]
async fn test_initialize_on_populated_store_closes_stale_days() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let db_path = db_path.to_str().unwrap();

    {
        let repo = Repository::init(&format!("sqlite:{db_path}?mode=rwc")).await?;
        repo.insert_sales_day(date("2020-01-05"), true).await?;
        repo.close().await;
    }

    // Second start against the same file: no data loss, stale day swept.
    let repo = Repository::connect(&format!("sqlite:{db_path}")).await?;
    repo.initialize(date("2020-01-06")).await?;

    let day = repo.get_sales_day(date("2020-01-05")).await?.unwrap();
    assert!(!day.open);
    assert!(repo.get_secret("admin-pass").await?.is_some());

    Ok(())
}

#[tokio::test]
async fn test_duplicate_day_insert_fails_at_store() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let repo = service.repository();

    repo.insert_sales_day(date("2024-01-01"), true).await?;
    let err = repo.insert_sales_day(date("2024-01-01"), false).await;
    assert!(matches!(
        err,
        Err(caixa::storage::StoreError::DuplicateDay(d)) if d == date("2024-01-01")
    ));

    Ok(())
}
