//! 沙龙查询与可约时段测试

mod support;

use booking_api::application::{CreateReservation, SLOT_PRICE};
use booking_api::domain::repositories::{SalonFilter, SalonSort};
use booking_api::domain::salon::PriceRange;
use manikura_common::Pagination;
use manikura_errors::AppError;
use support::{appointment_at, seed_salon, test_env};

#[tokio::test]
async fn test_city_filter_matches_substring_case_insensitive() {
    let env = test_env();
    seed_salon(&env, "Ongles & Co", "Paris", 4.8, 30, PriceRange::Standard);
    seed_salon(&env, "Belle Manucure", "Lyon", 4.2, 10, PriceRange::Budget);

    let filter = SalonFilter {
        city: Some("pAr".to_string()),
        ..Default::default()
    };
    let result = env
        .salon_service
        .list(&filter, SalonSort::Rating, Pagination::default())
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].name, "Ongles & Co");
}

#[tokio::test]
async fn test_unknown_city_returns_empty() {
    let env = test_env();
    seed_salon(&env, "Ongles & Co", "Paris", 4.8, 30, PriceRange::Standard);

    let filter = SalonFilter {
        city: Some("Marseille".to_string()),
        ..Default::default()
    };
    let result = env
        .salon_service
        .list(&filter, SalonSort::Rating, Pagination::default())
        .await
        .unwrap();

    assert!(result.is_empty());
}

#[tokio::test]
async fn test_filters_are_conjunctive() {
    let env = test_env();
    seed_salon(&env, "Chic", "Paris", 4.9, 40, PriceRange::Premium);
    seed_salon(&env, "Pas Cher", "Paris", 4.9, 15, PriceRange::Budget);
    seed_salon(&env, "Moyen", "Paris", 3.0, 5, PriceRange::Premium);

    let filter = SalonFilter {
        city: Some("Paris".to_string()),
        price_range: Some(PriceRange::Premium),
        min_rating: Some(4.5),
    };
    let result = env
        .salon_service
        .list(&filter, SalonSort::Rating, Pagination::default())
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].name, "Chic");
}

#[tokio::test]
async fn test_sort_by_price_uses_label_ordering() {
    let env = test_env();
    seed_salon(&env, "Luxe", "Paris", 4.0, 10, PriceRange::Premium);
    seed_salon(&env, "Eco", "Paris", 3.0, 10, PriceRange::Budget);
    seed_salon(&env, "Classique", "Paris", 5.0, 10, PriceRange::Standard);

    let result = env
        .salon_service
        .list(&SalonFilter::default(), SalonSort::Price, Pagination::default())
        .await
        .unwrap();

    let names: Vec<&str> = result.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Eco", "Classique", "Luxe"]);
}

#[tokio::test]
async fn test_default_sort_is_rating_desc() {
    let env = test_env();
    seed_salon(&env, "Bof", "Paris", 3.1, 10, PriceRange::Standard);
    seed_salon(&env, "Top", "Paris", 4.9, 10, PriceRange::Standard);

    let result = env
        .salon_service
        .list(&SalonFilter::default(), SalonSort::Rating, Pagination::default())
        .await
        .unwrap();

    assert_eq!(result[0].name, "Top");
}

#[tokio::test]
async fn test_search_across_fields() {
    let env = test_env();
    seed_salon(&env, "Ongles & Co", "Paris", 4.8, 30, PriceRange::Standard);
    seed_salon(&env, "Belle Manucure", "Lyon", 4.2, 10, PriceRange::Budget);

    // 命中城市
    let by_city = env.salon_service.search("lyon", 10).await.unwrap();
    assert_eq!(by_city.len(), 1);
    assert_eq!(by_city[0].name, "Belle Manucure");

    // 命中名称
    let by_name = env.salon_service.search("ongles", 10).await.unwrap();
    assert_eq!(by_name.len(), 1);

    // 命中描述（seed 描述为 "Institut <name>"）
    let by_description = env.salon_service.search("institut", 10).await.unwrap();
    assert_eq!(by_description.len(), 2);
}

#[tokio::test]
async fn test_popular_thresholds() {
    let env = test_env();
    seed_salon(&env, "Star", "Paris", 4.9, 50, PriceRange::Standard);
    seed_salon(&env, "Bien Noté Peu Connu", "Paris", 4.8, 5, PriceRange::Standard);
    seed_salon(&env, "Connu Mal Noté", "Paris", 3.9, 100, PriceRange::Standard);

    let popular = env.salon_service.popular(6).await.unwrap();

    assert_eq!(popular.len(), 1);
    assert_eq!(popular[0].name, "Star");
}

#[tokio::test]
async fn test_get_salon_not_found() {
    let env = test_env();

    let result = env.salon_service.get(999).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_availability_returns_ten_slots() {
    let env = test_env();
    let salon = seed_salon(&env, "Ongles & Co", "Paris", 4.8, 30, PriceRange::Standard);

    let availability = env
        .salon_service
        .availability(salon.id, "2026-02-14".parse().unwrap())
        .await
        .unwrap();

    assert_eq!(availability.slots.len(), 10);
    assert_eq!(availability.slots[0].time, "09:00");
    assert_eq!(availability.slots[9].time, "18:00");
    assert!(availability.slots.iter().all(|s| s.available));
    assert!(availability.slots.iter().all(|s| (s.price - SLOT_PRICE).abs() < f64::EPSILON));
}

#[tokio::test]
async fn test_availability_marks_booked_slot() {
    let env = test_env();
    let salon = seed_salon(&env, "Ongles & Co", "Paris", 4.8, 30, PriceRange::Standard);
    let client = env.auth.login("cliente@example.com", "pw").await.unwrap().user;

    env.reservation_service
        .create(CreateReservation {
            salon_id: salon.id,
            client_id: client.id,
            service_type: "manucure".to_string(),
            appointment_date: appointment_at(10),
            duration_minutes: 60,
            price: 45.0,
            client_notes: None,
        })
        .await
        .unwrap();

    let availability = env
        .salon_service
        .availability(salon.id, "2026-02-14".parse().unwrap())
        .await
        .unwrap();

    let slot_10 = availability.slots.iter().find(|s| s.time == "10:00").unwrap();
    assert!(!slot_10.available);

    let booked: Vec<&str> = availability
        .slots
        .iter()
        .filter(|s| !s.available)
        .map(|s| s.time.as_str())
        .collect();
    assert_eq!(booked, vec!["10:00"]);
}

#[tokio::test]
async fn test_availability_spanning_reservation_blocks_multiple_slots() {
    let env = test_env();
    let salon = seed_salon(&env, "Ongles & Co", "Paris", 4.8, 30, PriceRange::Standard);
    let client = env.auth.login("cliente@example.com", "pw").await.unwrap().user;

    // 90 分钟：占用 10:00 和 11:00 两个时段
    env.reservation_service
        .create(CreateReservation {
            salon_id: salon.id,
            client_id: client.id,
            service_type: "pose".to_string(),
            appointment_date: appointment_at(10),
            duration_minutes: 90,
            price: 65.0,
            client_notes: None,
        })
        .await
        .unwrap();

    let availability = env
        .salon_service
        .availability(salon.id, "2026-02-14".parse().unwrap())
        .await
        .unwrap();

    let booked: Vec<&str> = availability
        .slots
        .iter()
        .filter(|s| !s.available)
        .map(|s| s.time.as_str())
        .collect();
    assert_eq!(booked, vec!["10:00", "11:00"]);
}

#[tokio::test]
async fn test_availability_ignores_cancelled_reservation() {
    let env = test_env();
    let salon = seed_salon(&env, "Ongles & Co", "Paris", 4.8, 30, PriceRange::Standard);
    let client = env.auth.login("cliente@example.com", "pw").await.unwrap().user;

    let reservation = env
        .reservation_service
        .create(CreateReservation {
            salon_id: salon.id,
            client_id: client.id,
            service_type: "manucure".to_string(),
            appointment_date: appointment_at(10),
            duration_minutes: 60,
            price: 45.0,
            client_notes: None,
        })
        .await
        .unwrap();

    env.reservation_service.cancel(reservation.id).await.unwrap();

    let availability = env
        .salon_service
        .availability(salon.id, "2026-02-14".parse().unwrap())
        .await
        .unwrap();

    assert!(availability.slots.iter().all(|s| s.available));
}

#[tokio::test]
async fn test_availability_unknown_salon() {
    let env = test_env();

    let result = env
        .salon_service
        .availability(999, "2026-02-14".parse().unwrap())
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}
