pub mod m202510010001_create_users;
pub mod m202510010002_create_students;
pub mod m202510010003_create_subjects;
pub mod m202510010004_create_enrollments;
pub mod m202510010005_create_attendance_records;
pub mod m202510010006_create_email_logs;
pub mod m202510010007_create_sessions;
pub mod m202510010008_create_system_settings;
pub mod m202510010009_create_calendar_events;
