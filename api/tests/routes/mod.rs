mod admin_test;
mod attendance_test;
mod auth_test;
mod calendar_test;
mod emails_test;
mod health_test;
mod me_test;
mod settings_test;
mod students_test;
mod subjects_test;
