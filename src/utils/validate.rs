use once_cell::sync::Lazy;
use regex::Regex;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Invalid username regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}$").expect("Invalid email regex")
});

pub fn validate_username(username: &str) -> Result<(), &'static str> {
    // 用户名长度：3 <= x <= 32
    if username.len() < 3 || username.len() > 32 {
        return Err("Username length must be between 3 and 32 characters");
    }
    // 用户名格式校验：只能包含字母、数字、下划线或连字符
    if !USERNAME_RE.is_match(username) {
        return Err("Username must contain only letters, numbers, underscores or hyphens");
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    // 邮箱格式校验：必须包含 @ 和 .
    if !EMAIL_RE.is_match(email) {
        return Err("Email format is invalid");
    }
    Ok(())
}

/// 考试、考勤日期 YYYY-MM-DD
pub fn validate_date(date: &str) -> Result<chrono::NaiveDate, &'static str> {
    chrono::NaiveDate::parse_from_str(date, crate::models::exams::entities::EXAM_DATE_FORMAT)
        .map_err(|_| "Date must be in YYYY-MM-DD format")
}

/// 考试开始时间 HH:MM
pub fn validate_time(time: &str) -> Result<chrono::NaiveTime, &'static str> {
    if time.len() != 5 {
        return Err("Time must be in HH:MM format");
    }
    chrono::NaiveTime::parse_from_str(time, crate::models::exams::entities::EXAM_TIME_FORMAT)
        .map_err(|_| "Time must be in HH:MM format")
}

/// 外部链接只接受 http(s)，以及本服务的相对下载路径
pub fn validate_url(url: &str) -> Result<(), &'static str> {
    let url = url.trim();
    if url.is_empty() {
        return Err("URL must not be empty");
    }
    if url.len() > 2048 {
        return Err("URL is too long");
    }
    if url.starts_with("https://") || url.starts_with("http://") || url.starts_with("/api/v1/files/") {
        Ok(())
    } else {
        Err("URL must start with http:// or https://")
    }
}

/// 必填文本去除首尾空白后非空且不超过上限
pub fn validate_required_text(value: &str, max_chars: usize) -> Result<(), String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("must not be empty".to_string());
    }
    if trimmed.chars().count() > max_chars {
        return Err(format!("must be at most {max_chars} characters"));
    }
    Ok(())
}

const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 128;
const COMMON_PASSWORDS: &[&str] = &[
    "password1",
    "12345678a",
    "qwerty123",
    "admin123",
    "bismillah1",
];

/// 密码策略：8 到 128 个字符，至少包含一个字母和一个数字
///
/// 违反多条时一并返回，以 `; ` 分隔。
pub fn validate_password(password: &str) -> Result<(), String> {
    let mut problems = Vec::new();
    let len = password.chars().count();
    if len < PASSWORD_MIN {
        problems.push(format!("must be at least {PASSWORD_MIN} characters"));
    }
    if len > PASSWORD_MAX {
        problems.push(format!("must be at most {PASSWORD_MAX} characters"));
    }
    if !password.chars().any(|c| c.is_alphabetic()) {
        problems.push("must contain a letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        problems.push("must contain a digit".to_string());
    }
    if COMMON_PASSWORDS
        .iter()
        .any(|weak| password.eq_ignore_ascii_case(weak))
    {
        problems.push("is too common".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(format!("Password {}", problems.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(validate_username("budi").is_ok());
        assert!(validate_username("bu").is_err());
        assert!(validate_username("budi santoso").is_err());
    }

    #[test]
    fn test_date_and_time() {
        assert!(validate_date("2025-02-29").is_err());
        assert!(validate_date("2024-02-29").is_ok());
        assert!(validate_time("07:30").is_ok());
        assert!(validate_time("7:30").is_err());
        assert!(validate_time("24:00").is_err());
    }

    #[test]
    fn test_url_rules() {
        assert!(validate_url("https://youtu.be/abc").is_ok());
        assert!(validate_url("/api/v1/files/download/abc").is_ok());
        assert!(validate_url("javascript:alert(1)").is_err());
        assert!(validate_url("  ").is_err());
    }

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Bab 1", 10).is_ok());
        assert!(validate_required_text("   ", 10).is_err());
        assert!(validate_required_text("abcdefghijk", 10).is_err());
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password("belajar2025").is_ok());
        assert!(validate_password("Kelas7B!x").is_ok());

        let err = validate_password("ab1").unwrap_err();
        assert!(err.contains("at least 8"));
        assert!(validate_password("abcdefgh").unwrap_err().contains("digit"));
        assert!(validate_password("12345678").unwrap_err().contains("letter"));
        assert!(validate_password("Admin123").unwrap_err().contains("too common"));

        let both = validate_password("abc").unwrap_err();
        assert!(both.contains("; "));
    }
}
