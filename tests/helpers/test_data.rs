//! Test data helpers for creating records

use chrono::{DateTime, Duration, TimeZone, Utc};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use uniexp_admin::models::{
    Event, EventCategory, EventStatus, Faculty, Feedback, Likert, Location, Merchandise, MerchandiseCategory,
    QuestListItem, QuestType, Redemption, User,
};

/// A student with generated name and email
pub fn fake_student() -> User {
    let faculty = Faculty::ALL[(0..Faculty::ALL.len()).fake::<usize>()];
    User {
        id: String::new(),
        first_name: FirstName().fake(),
        last_name: LastName().fake(),
        email: SafeEmail().fake(),
        faculty,
        year_of_study: (1..=4).fake(),
        profile_picture: None,
    }
}

pub fn named_student(first_name: &str, last_name: &str, year_of_study: u8, faculty: Faculty) -> User {
    User {
        id: String::new(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: format!("{}.{}@uni.edu", first_name.to_lowercase(), last_name.to_lowercase()),
        faculty,
        year_of_study,
        profile_picture: None,
    }
}

pub fn test_event(organiser_id: &str, category: EventCategory, start: DateTime<Utc>) -> Event {
    Event {
        id: String::new(),
        name: "Campus Hackathon".to_string(),
        description: "Build something in 24 hours".to_string(),
        category,
        event_start_date_time: start,
        event_end_date_time: start + Duration::hours(24),
        registration_closing_date: start - Duration::days(1),
        location: Location {
            name: "Main Hall".to_string(),
            latitude: 3.1201,
            longitude: 101.6544,
        },
        capacity: Some(200),
        payment_proof_required: false,
        images: Vec::new(),
        status: EventStatus::Scheduled,
        organiser_id: organiser_id.to_string(),
    }
}

pub fn attendance_quest() -> QuestListItem {
    QuestListItem {
        id: String::new(),
        quest_name: "Attendance".to_string(),
        description: "Attend the event".to_string(),
        quest_type: QuestType::Attendance,
        completion_num: 1,
        points_rewards: 10,
        diamonds_rewards: 5,
        max_early_bird: None,
        question: None,
        correct_answer: None,
    }
}

pub fn test_feedback(event_id: &str, registration_id: &str, event_rating: u8, gamification_rating: u8) -> Feedback {
    Feedback {
        id: String::new(),
        event_id: event_id.to_string(),
        registration_id: registration_id.to_string(),
        event_feedback: Likert::new(event_rating).expect("rating in range"),
        gamification_feedback: Likert::new(gamification_rating).expect("rating in range"),
        overall_improvement: "More food".to_string(),
    }
}

pub fn test_merchandise() -> Merchandise {
    Merchandise {
        id: String::new(),
        name: "UniEXP Hoodie".to_string(),
        description: "Warm".to_string(),
        diamonds_to_redeem: 150,
        category: MerchandiseCategory::Clothing,
        sizes: Some(vec!["S".to_string(), "M".to_string()]),
        collection_location_name: "Student Centre".to_string(),
        images: Vec::new(),
        available: true,
    }
}

pub fn test_redemption(merchandise_id: &str, student_id: &str, collected: bool) -> Redemption {
    Redemption {
        id: String::new(),
        merchandise_id: merchandise_id.to_string(),
        student_id: student_id.to_string(),
        selected_size: Some("M".to_string()),
        quantity: 1,
        collected,
    }
}

/// Mid-month instant `months_ago` months before 2024-06-15
pub fn month_offset(months_ago: u32) -> DateTime<Utc> {
    let base = Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).single().expect("valid date");
    base.checked_sub_months(chrono::Months::new(months_ago)).expect("valid date")
}
