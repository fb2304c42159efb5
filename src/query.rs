use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use sea_orm::prelude::DateTimeWithTimeZone;

use crate::validation::{ValidationError, ValidationErrors};

/// `LIKE` パターンのエスケープ文字
pub const LIKE_ESCAPE: char = '\\';

lazy_static! {
    /// 月フィルタの形式 (例: 2025-03)
    static ref MONTH_REGEX: Regex = Regex::new(r"^(\d{4})-(0[1-9]|1[0-2])$").unwrap();
}

/// 完了状態によるフィルタ
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl FromStr for StatusFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "completed" => Ok(StatusFilter::Completed),
            other => Err(ValidationError::InvalidEnumValue {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// 並び替え対象のフィールド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    Title,
    Priority,
    CreatedAt,
    UpdatedAt,
    DueDate,
}

/// DRFの `?ordering=-created_at` 形式の並び順
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub field: OrderField,
    pub descending: bool,
}

impl Default for Ordering {
    fn default() -> Self {
        Ordering {
            field: OrderField::CreatedAt,
            descending: true,
        }
    }
}

impl FromStr for Ordering {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, name) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let field = match name {
            "title" => OrderField::Title,
            "priority" => OrderField::Priority,
            "created_at" => OrderField::CreatedAt,
            "updated_at" => OrderField::UpdatedAt,
            "due_date" => OrderField::DueDate,
            _ => {
                return Err(ValidationError::InvalidEnumValue {
                    field: "ordering",
                    value: s.to_string(),
                })
            }
        };
        Ok(Ordering { field, descending })
    }
}

/// 年月 (UTC)。月単位のフィルタと統計に使用します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(ts: &DateTimeWithTimeZone) -> Self {
        let utc = ts.with_timezone(&Utc);
        YearMonth {
            year: utc.year(),
            month: utc.month(),
        }
    }

    pub fn contains(&self, ts: &DateTimeWithTimeZone) -> bool {
        YearMonth::of(ts) == *self
    }

    fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            YearMonth {
                year: self.year + 1,
                month: 1,
            }
        } else {
            YearMonth {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// `[月初, 翌月初)` の範囲
    pub fn range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.first_day().and_time(Default::default()).and_utc();
        let end = self.next().first_day().and_time(Default::default()).and_utc();
        (start, end)
    }

    /// 表示名 (例: "March 2025")
    pub fn display_name(&self) -> String {
        self.first_day().format("%B %Y").to_string()
    }
}

impl FromStr for YearMonth {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mismatch = ValidationError::TypeMismatch {
            field: "month",
            expected: "YYYY-MM",
        };
        let caps = MONTH_REGEX.captures(s.trim()).ok_or(mismatch.clone())?;
        let year = caps[1].parse().map_err(|_| mismatch.clone())?;
        let month = caps[2].parse().map_err(|_| mismatch)?;
        Ok(YearMonth { year, month })
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// 一覧APIのクエリパラメータ。
/// Djangoの `django-filter` + `OrderingFilter` + `SearchFilter` に相当します。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoQuery {
    pub status: StatusFilter,
    pub search: Option<String>,
    pub month: Option<YearMonth>,
    pub ordering: Ordering,
}

impl TodoQuery {
    /// クエリ文字列の値から構築します。不正な値はまとめてエラーとして返します。
    pub fn from_params(
        status: Option<&str>,
        search: Option<&str>,
        month: Option<&str>,
        ordering: Option<&str>,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let mut query = TodoQuery::default();

        if let Some(raw) = status.filter(|s| !s.is_empty()) {
            match raw.parse() {
                Ok(status) => query.status = status,
                Err(e) => errors.push(e),
            }
        }
        query.search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        match parse_month(month) {
            Ok(month) => query.month = month,
            Err(e) => errors.push(e),
        }
        if let Some(raw) = ordering.filter(|s| !s.is_empty()) {
            match raw.parse() {
                Ok(ordering) => query.ordering = ordering,
                Err(e) => errors.push(e),
            }
        }

        errors.into_result()?;
        Ok(query)
    }

    /// 検索語を `LIKE` のパターンに変換します (小文字化済み)。
    /// `%` `_` `\` はエスケープするため、文字通りの部分一致になります。
    pub fn search_pattern(&self) -> Option<String> {
        self.search.as_ref().map(|search| {
            let mut pattern = String::with_capacity(search.len() + 2);
            pattern.push('%');
            for c in search.to_lowercase().chars() {
                if matches!(c, '%' | '_' | LIKE_ESCAPE) {
                    pattern.push(LIKE_ESCAPE);
                }
                pattern.push(c);
            }
            pattern.push('%');
            pattern
        })
    }

    /// タイトルか説明に検索語を含むか (大文字小文字を区別しない)
    pub fn matches_search(&self, title: &str, description: &str) -> bool {
        match &self.search {
            Some(search) => {
                let needle = search.to_lowercase();
                title.to_lowercase().contains(&needle) || description.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }
}

/// 空や未指定なら `None`
pub fn parse_month(raw: Option<&str>) -> Result<Option<YearMonth>, ValidationError> {
    raw.filter(|s| !s.trim().is_empty()).map(str::parse::<YearMonth>).transpose()
}
