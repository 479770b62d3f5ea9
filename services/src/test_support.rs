use chrono::{Duration, NaiveDate};
use db::models::{
    attendance_record::{self, NewRecord},
    enrollment, student, subject,
    user::{self, Role},
};
use db::test_utils::setup_test_db;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Monday 2025-10-13 plus `offset` days.
pub fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 13).unwrap() + Duration::days(offset)
}

/// One adviser, one subject and `n` enrolled students with email addresses.
pub struct Fixture {
    pub db: DatabaseConnection,
    pub adviser: user::Model,
    pub subject: subject::Model,
    pub students: Vec<student::Model>,
}

impl Fixture {
    pub async fn new(n: usize) -> Self {
        let db = setup_test_db().await;
        let adviser = user::Model::create(&db, "adviser", "adviser@school.test", "pw", Role::Adviser, Some("EMP-1"), "Adviser")
            .await
            .unwrap();
        let subject = subject::Model::create(
            &db,
            "MATH7",
            "Mathematics 7",
            Some(adviser.id),
            chrono::NaiveTime::from_hms_opt(8, 0, 0),
            chrono::NaiveTime::from_hms_opt(9, 0, 0),
        )
        .await
        .unwrap();

        let mut students = Vec::with_capacity(n);
        for i in 0..n {
            let (tag, number, email) = (format!("TAG{i:04}"), format!("2025-{i:04}"), format!("student{i}@home.test"));
            let s = student::Model::create(
                &db,
                &format!("Student {i}"),
                Some(tag.as_str()),
                Some(number.as_str()),
                Some(email.as_str()),
                None,
            )
            .await
            .unwrap();
            enrollment::Model::enroll(&db, s.id, subject.id).await.unwrap();
            students.push(s);
        }

        Self { db, adviser, subject, students }
    }

    /// Ensures ABSENT rows exist on `day(0)..day(count)`.
    pub async fn absent_on_days(&self, student_id: i64, count: i64) {
        for d in 0..count {
            attendance_record::Model::insert_if_absent(&self.db, NewRecord::absent(student_id, self.subject.id, day(d)))
                .await
                .unwrap();
        }
    }

    pub async fn opt_out(&self, student_id: i64) {
        let s = student::Model::get_by_id(&self.db, student_id).await.unwrap().unwrap();
        let mut active: student::ActiveModel = s.into();
        active.email_opt_in = Set(false);
        active.update(&self.db).await.unwrap();
    }

    pub async fn assign_adviser(&self, student_id: i64) {
        let s = student::Model::get_by_id(&self.db, student_id).await.unwrap().unwrap();
        let mut active: student::ActiveModel = s.into();
        active.adviser_id = Set(Some(self.adviser.id));
        active.update(&self.db).await.unwrap();
    }
}
