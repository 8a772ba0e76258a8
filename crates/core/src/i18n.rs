use serde::{Deserialize, Serialize};

/// Display languages offered by the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Ko,
    En,
    Hi,
}

impl Lang {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ko => "ko",
            Self::En => "en",
            Self::Hi => "hi",
        }
    }

    /// Parses a language code, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ko" => Some(Self::Ko),
            "en" => Some(Self::En),
            "hi" => Some(Self::Hi),
            _ => None,
        }
    }
}

/// Fixed UI strings for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Labels {
    pub title: &'static str,
    pub add_city: &'static str,
    pub select_city: &'static str,
    pub register: &'static str,
    pub venue_name: &'static str,
    pub seats: &'static str,
    pub indoor: &'static str,
    pub outdoor: &'static str,
    pub google_link: &'static str,
    pub special_notes: &'static str,
    pub tour_route: &'static str,
    pub tour_map: &'static str,
    pub admin_mode: &'static str,
    pub guest_mode: &'static str,
    pub password: &'static str,
    pub submit: &'static str,
    pub date: &'static str,
}

const EN: Labels = Labels {
    title: "Cantata Tour 2025",
    add_city: "Add City",
    select_city: "Select City",
    register: "Register",
    venue_name: "Venue",
    seats: "Seats",
    indoor: "Indoor",
    outdoor: "Outdoor",
    google_link: "Google Maps Link",
    special_notes: "Notes",
    tour_route: "Tour Route",
    tour_map: "Tour Map",
    admin_mode: "Admin Mode",
    guest_mode: "Guest Mode",
    password: "Enter Admin Password",
    submit: "Submit",
    date: "Date",
};

const KO: Labels = Labels {
    title: "칸타타 투어 2025",
    add_city: "도시 추가",
    select_city: "도시 선택",
    register: "등록",
    venue_name: "공연장",
    seats: "좌석 수",
    indoor: "실내",
    outdoor: "실외",
    google_link: "구글 링크",
    special_notes: "특이사항",
    tour_route: "투어 경로",
    tour_map: "투어 지도",
    admin_mode: "관리자 모드",
    guest_mode: "손님 모드",
    password: "관리자 비밀번호 입력",
    submit: "확인",
    date: "날짜",
};

const HI: Labels = Labels {
    title: "कांताता टूर 2025",
    add_city: "शहर जोड़ें",
    select_city: "शहर चुनें",
    register: "रजिस्टर",
    venue_name: "स्थल",
    seats: "सीटें",
    indoor: "इंडोर",
    outdoor: "आउटडोर",
    google_link: "गूगल लिंक",
    special_notes: "टिप्पणियाँ",
    tour_route: "टूर मार्ग",
    tour_map: "टूर मानचित्र",
    admin_mode: "एडमिन मोड",
    guest_mode: "गेस्ट मोड",
    password: "पासवर्ड दर्ज करें",
    submit: "सबमिट",
    date: "तारीख",
};

pub fn labels(lang: Lang) -> &'static Labels {
    match lang {
        Lang::Ko => &KO,
        Lang::En => &EN,
        Lang::Hi => &HI,
    }
}
