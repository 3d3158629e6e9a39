//! Tips module - советы для восстановления спины

use chrono::{Datelike, NaiveDate};
use rand::seq::SliceRandom;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TipCategory {
    Posture,     // Осанка
    Movement,    // Движение в течение дня
    Technique,   // Техника упражнений
    Recovery,    // Восстановление
    Motivation,  // Мотивация
}

impl TipCategory {
    pub fn emoji(&self) -> &'static str {
        match self {
            TipCategory::Posture => "🧍",
            TipCategory::Movement => "🚶",
            TipCategory::Technique => "📐",
            TipCategory::Recovery => "😴",
            TipCategory::Motivation => "💪",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TipCategory::Posture => "Осанка",
            TipCategory::Movement => "Движение",
            TipCategory::Technique => "Техника",
            TipCategory::Recovery => "Восстановление",
            TipCategory::Motivation => "Мотивация",
        }
    }
}

pub struct Tip {
    pub category: TipCategory,
    pub text: &'static str,
}

pub const TIPS: &[Tip] = &[
    // === ОСАНКА ===
    Tip {
        category: TipCategory::Posture,
        text: "Экран на уровне глаз, стопы полностью на полу, поясница опирается на спинку стула.",
    },
    Tip {
        category: TipCategory::Posture,
        text: "Поднимая предмет с пола, сгибай колени и держи груз близко к телу, не скручивая корпус.",
    },
    Tip {
        category: TipCategory::Posture,
        text: "Спи на боку с подушкой между коленями или на спине с валиком под коленями.",
    },
    // === ДВИЖЕНИЕ ===
    Tip {
        category: TipCategory::Movement,
        text: "Регулярно делайте перерывы и разминку, если у вас сидячая работа. Это улучшит кровообращение и снизит нагрузку на позвоночник.",
    },
    Tip {
        category: TipCategory::Movement,
        text: "Вставай и проходи пару минут каждые полчаса сидения.",
    },
    Tip {
        category: TipCategory::Movement,
        text: "Ходьба в спокойном темпе 20-30 минут в день - одно из лучших упражнений для спины.",
    },
    // === ТЕХНИКА ===
    Tip {
        category: TipCategory::Technique,
        text: "Во всех упражнениях поясница нейтральна: без сильного прогиба и без округления.",
    },
    Tip {
        category: TipCategory::Technique,
        text: "Медленно и под контролем лучше, чем быстро и много. Качество важнее количества.",
    },
    Tip {
        category: TipCategory::Technique,
        text: "Не задерживай дыхание: выдох на усилии, вдох на возврате.",
    },
    // === ВОССТАНОВЛЕНИЕ ===
    Tip {
        category: TipCategory::Recovery,
        text: "Лёгкая мышечная усталость - норма. Острая или стреляющая боль - сигнал остановиться.",
    },
    Tip {
        category: TipCategory::Recovery,
        text: "Если упражнение даётся слишком тяжело, отметь его и вернись к предыдущему этапу.",
    },
    Tip {
        category: TipCategory::Recovery,
        text: "Сон 7-9 часов - время, когда ткани восстанавливаются быстрее всего.",
    },
    // === МОТИВАЦИЯ ===
    Tip {
        category: TipCategory::Motivation,
        text: "Десять минут каждый день дают больше, чем час раз в неделю.",
    },
    Tip {
        category: TipCategory::Motivation,
        text: "Отмечай прогресс: то, что месяц назад было трудно, сегодня уже разминка.",
    },
    Tip {
        category: TipCategory::Motivation,
        text: "Пропустил день - не страшно. Главное не пропустить два подряд.",
    },
];

/// Получить случайный совет
pub fn get_random_tip() -> &'static Tip {
    TIPS.choose(&mut rand::thread_rng()).unwrap_or(&TIPS[0])
}

/// Совет дня: один и тот же в течение суток
pub fn tip_of_the_day(date: NaiveDate) -> &'static Tip {
    let idx = date.num_days_from_ce().rem_euclid(TIPS.len() as i32) as usize;
    &TIPS[idx]
}

/// Форматировать совет для вывода
pub fn format_tip(tip: &Tip) -> String {
    format!(
        "{} {}\n\n{}",
        tip.category.emoji(),
        tip.category.name(),
        tip.text
    )
}
