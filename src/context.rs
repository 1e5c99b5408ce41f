//! Builds the system prompt for the FAQ chat.
//!
//! The static instructions are marketing copy maintained by hand. The
//! dynamic part (news, open positions, contact details) is read from the
//! store on every request and never cached.

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use tracing::warn;

use crate::models::{JobPosting, NewsItem, SiteSetting};
use crate::store::ContentStore;

pub const NEWS_LIMIT: usize = 10;
pub const EXCERPT_BUDGET: usize = 150;
pub const REQUIREMENTS_BUDGET: usize = 200;

pub const CONTACT_KEYS: [&str; 4] = [
    "contact_phone",
    "contact_email",
    "contact_address",
    "contact_line",
];

pub const BASE_PROMPT: &str = "คุณคือผู้ช่วยตอบคำถามของกลุ่มบริษัท ซึ่งดำเนินธุรกิจ 4 กลุ่มหลัก ได้แก่
1. อสังหาริมทรัพย์: โครงการบ้านเดี่ยว ทาวน์โฮม และคอนโดมิเนียม
2. โรงแรมและการบริการ: โรงแรมและรีสอร์ต พร้อมห้องประชุมและจัดเลี้ยง
3. โรงพยาบาลสัตว์: บริการตรวจรักษา ฉีดวัคซีน ผ่าตัด และดูแลสัตว์เลี้ยงตลอด 24 ชั่วโมง
4. ผลิตภัณฑ์สุขภาพ: อาหารเสริมและผลิตภัณฑ์เพื่อสุขภาพที่ได้รับมาตรฐาน อย.

แนวทางการตอบ:
- ตอบเป็นภาษาเดียวกับที่ผู้ใช้ถาม สุภาพ กระชับ และเป็นมิตร
- ใช้เฉพาะข้อมูลในข้อความนี้ หากไม่ทราบคำตอบ ให้แนะนำให้ติดต่อเจ้าหน้าที่
- ห้ามแต่งราคา โปรโมชั่น หรือข้อมูลที่ไม่มีอยู่ในข้อมูลด้านล่าง
- หากถามเรื่องการสมัครงาน ให้อ้างอิงตำแหน่งงานที่เปิดรับด้านล่าง";

pub const DEFAULT_CONTACT_BLOCK: &str = "

## ข้อมูลติดต่อ
- โทรศัพท์: 02-123-4567
- อีเมล: info@company.co.th
- ที่อยู่: กรุงเทพมหานคร ประเทศไทย
- เวลาทำการ: จันทร์ - ศุกร์ 08:30 - 17:30 น.";

const THAI_MONTHS: [&str; 12] = [
    "มกราคม",
    "กุมภาพันธ์",
    "มีนาคม",
    "เมษายน",
    "พฤษภาคม",
    "มิถุนายน",
    "กรกฎาคม",
    "สิงหาคม",
    "กันยายน",
    "ตุลาคม",
    "พฤศจิกายน",
    "ธันวาคม",
];

const BUDDHIST_ERA_OFFSET: i32 = 543;
const BANGKOK_UTC_OFFSET_SECS: i32 = 7 * 3600;

/// Full system prompt: static instructions followed by the news, jobs and
/// contact blocks in that order.
pub async fn build_system_prompt(store: &dyn ContentStore) -> String {
    let context = fetch_context(store).await;
    format!("{BASE_PROMPT}{context}")
}

/// Runs the three reads concurrently. Each branch handles its own failure,
/// so one bad query only blanks its own section.
pub async fn fetch_context(store: &dyn ContentStore) -> String {
    let (news, jobs, contact) = tokio::join!(
        news_block(store),
        jobs_block(store),
        contact_block(store)
    );

    format!("{news}{jobs}{contact}")
}

async fn news_block(store: &dyn ContentStore) -> String {
    match store.latest_news(NEWS_LIMIT).await {
        Ok(items) => render_news(&items),
        Err(e) => {
            warn!(error = %e, "news context unavailable");
            String::new()
        }
    }
}

async fn jobs_block(store: &dyn ContentStore) -> String {
    match store.open_jobs().await {
        Ok(jobs) => render_jobs(&jobs),
        Err(e) => {
            warn!(error = %e, "job context unavailable");
            String::new()
        }
    }
}

async fn contact_block(store: &dyn ContentStore) -> String {
    match store.contact_settings(&CONTACT_KEYS).await {
        Ok(settings) => render_contact(&settings),
        Err(e) => {
            warn!(error = %e, "contact context unavailable, using defaults");
            DEFAULT_CONTACT_BLOCK.to_string()
        }
    }
}

pub fn render_news(items: &[NewsItem]) -> String {
    if items.is_empty() {
        return String::new();
    }

    let mut out = String::from("\n\n## ข่าวสารและกิจกรรมล่าสุด");
    for (i, item) in items.iter().enumerate() {
        out.push_str(&format!("\n{}. {}", i + 1, item.title));
        if let Some(date) = item.published_at {
            out.push_str(&format!(" ({})", thai_date(date)));
        }
        if let Some(category) = non_blank(&item.category) {
            out.push_str(&format!(" [{category}]"));
        }
        if let Some(excerpt) = non_blank(&item.excerpt) {
            out.push_str(&format!("\n   {}", truncate(excerpt, EXCERPT_BUDGET)));
        }
    }
    out
}

pub fn render_jobs(jobs: &[JobPosting]) -> String {
    if jobs.is_empty() {
        return String::new();
    }

    let mut out = String::from("\n\n## ตำแหน่งงานที่เปิดรับสมัคร");
    for (i, job) in jobs.iter().enumerate() {
        out.push_str(&format!("\n{}. {}", i + 1, job.title));

        let details: Vec<&str> = [&job.department, &job.location, &job.employment_type]
            .into_iter()
            .filter_map(non_blank)
            .collect();
        if !details.is_empty() {
            out.push_str(&format!(" ({})", details.join(", ")));
        }

        if let Some(requirements) = non_blank(&job.requirements) {
            out.push_str(&format!(
                "\n   คุณสมบัติ: {}",
                truncate(requirements, REQUIREMENTS_BUDGET)
            ));
        }
    }
    out
}

pub fn render_contact(settings: &[SiteSetting]) -> String {
    let lines: Vec<String> = CONTACT_KEYS
        .iter()
        .filter_map(|key| {
            let setting = settings
                .iter()
                .find(|s| s.key == *key && !s.value.trim().is_empty())?;
            Some(format!("- {}: {}", contact_label(key), setting.value.trim()))
        })
        .collect();

    if lines.is_empty() {
        return DEFAULT_CONTACT_BLOCK.to_string();
    }

    format!("\n\n## ข้อมูลติดต่อ\n{}", lines.join("\n"))
}

fn contact_label(key: &str) -> &'static str {
    match key {
        "contact_phone" => "โทรศัพท์",
        "contact_email" => "อีเมล",
        "contact_address" => "ที่อยู่",
        "contact_line" => "LINE",
        _ => "อื่น ๆ",
    }
}

/// "15 มกราคม 2568": Thai month names, Buddhist-era year, Bangkok time.
pub fn thai_date(date: DateTime<Utc>) -> String {
    let bangkok = FixedOffset::east_opt(BANGKOK_UTC_OFFSET_SECS).expect("UTC+7 is in range");
    let local = date.with_timezone(&bangkok);

    format!(
        "{} {} {}",
        local.day(),
        THAI_MONTHS[local.month0() as usize],
        local.year() + BUDDHIST_ERA_OFFSET
    )
}

/// Cuts `text` to at most `budget` characters, appending "..." when cut.
pub fn truncate(text: &str, budget: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(budget) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
