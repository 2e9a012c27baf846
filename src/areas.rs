use chrono::{Datelike, Local};

use crate::model::{DevelopmentGrid, EvaluationLevel, EvaluationPeriod, SkillMap};

pub struct AreaSpec {
    pub key: &'static str,
    pub title: &'static str,
    pub skills: &'static [(&'static str, &'static str)],
}

pub const AREAS: [AreaSpec; 5] = [
    AreaSpec {
        key: "motor",
        title: "Desenvolvimento Motor",
        skills: &[
            ("corre", "Corre com segurança"),
            ("pula", "Pula com os dois pés"),
            ("coordFina", "Utiliza tesoura e realiza traços"),
            ("equilibrio", "Mantém o equilíbrio em um pé só"),
        ],
    },
    AreaSpec {
        key: "cognitive",
        title: "Desenvolvimento Cognitivo",
        skills: &[
            ("cores", "Reconhece cores primárias"),
            ("numeros", "Conta até 10"),
            ("formas", "Identifica formas geométricas básicas"),
            ("instrucoes", "Segue instruções simples"),
            ("raciocinio", "Resolve quebra-cabeças simples"),
        ],
    },
    AreaSpec {
        key: "language",
        title: "Linguagem e Comunicação",
        skills: &[
            ("frases", "Fala frases completas"),
            ("historias", "Entende e re-conta histórias curtas"),
            ("perguntas", "Faz perguntas sobre o que o cerca"),
            ("vocabulario", "Possui vocabulário crescente"),
        ],
    },
    AreaSpec {
        key: "social",
        title: "Socioemocional",
        skills: &[
            ("interage", "Interage com colegas e adultos"),
            ("sentimentos", "Expressa seus sentimentos"),
            ("regras", "Respeita regras e combinados"),
            ("empatia", "Demonstra empatia pelos colegas"),
        ],
    },
    AreaSpec {
        key: "autonomy",
        title: "Hábitos e Autonomia",
        skills: &[
            ("alimenta", "Alimenta-se sozinho"),
            ("guarda", "Guarda seus materiais após o uso"),
            ("banheiro", "Usa o banheiro com independência"),
            ("veste", "Veste-se com ajuda mínima"),
        ],
    },
];

pub const LEVELS: [EvaluationLevel; 4] = [
    EvaluationLevel::NaoObservado,
    EvaluationLevel::EmDesenvolvimento,
    EvaluationLevel::Atingido,
    EvaluationLevel::AtingidoComAutonomia,
];

pub fn current_year() -> i32 {
    Local::now().year()
}

pub fn default_grid() -> DevelopmentGrid {
    let mut grid = DevelopmentGrid::default();
    for area in &AREAS {
        let slot: &mut SkillMap = match area.key {
            "motor" => &mut grid.motor,
            "cognitive" => &mut grid.cognitive,
            "language" => &mut grid.language,
            "social" => &mut grid.social,
            _ => &mut grid.autonomy,
        };
        for (skill, _) in area.skills {
            slot.insert((*skill).to_string(), EvaluationLevel::NaoObservado);
        }
    }
    grid
}

// Every student record starts with one period covering the current year.
pub fn default_period(year: i32) -> EvaluationPeriod {
    EvaluationPeriod {
        period: format!("1º Bimestre {}", year),
        start_date: None,
        end_date: None,
        evaluations: default_grid(),
        teacher_notes: Some(String::new()),
        psycho_notes: Some(String::new()),
        descriptive_report: Some(String::new()),
    }
}

// Suggests the period after the latest one on file. "4º Bimestre 2024"
// rolls over to "1º Bimestre 2025"; names that do not follow the
// "<n>º <Bimestre|Trimestre|Semestre> <year>" pattern fall back to the
// first bimester of the current year.
pub fn next_period_name(latest: Option<&str>, current_year: i32) -> String {
    let Some((number, kind, year)) = latest.and_then(parse_period_name) else {
        return format!("1º Bimestre {}", current_year);
    };
    let limit = match kind {
        "Trimestre" => 3,
        "Semestre" => 2,
        _ => 4,
    };
    let mut next = number + 1;
    let mut next_year = year;
    if next > limit {
        next = 1;
        next_year += 1;
    }
    format!("{}º {} {}", next, kind, next_year)
}

fn parse_period_name(name: &str) -> Option<(u32, &str, i32)> {
    let tokens: Vec<&str> = name.split_whitespace().collect();
    for window in tokens.windows(3) {
        let (num_tok, kind_tok, year_tok) = (window[0], window[1], window[2]);
        let digits = num_tok
            .strip_suffix('º')
            .or_else(|| num_tok.strip_suffix('ª'))
            .unwrap_or(num_tok);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if !matches!(kind_tok, "Bimestre" | "Trimestre" | "Semestre") {
            continue;
        }
        if year_tok.len() != 4 || !year_tok.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let number = digits.parse().ok()?;
        let year = year_tok.parse().ok()?;
        return Some((number, kind_tok, year));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grid_covers_all_areas() {
        let grid = default_grid();
        assert_eq!(grid.motor.len(), 4);
        assert_eq!(grid.cognitive.len(), 5);
        assert_eq!(grid.language.len(), 4);
        assert_eq!(grid.social.len(), 4);
        assert_eq!(grid.autonomy.len(), 4);
        assert!(grid
            .cognitive
            .values()
            .all(|level| *level == EvaluationLevel::NaoObservado));
    }

    #[test]
    fn default_period_names_first_bimester() {
        let period = default_period(2025);
        assert_eq!(period.period, "1º Bimestre 2025");
        assert_eq!(period.teacher_notes.as_deref(), Some(""));
        assert_eq!(period.descriptive_report.as_deref(), Some(""));
    }

    #[test]
    fn next_period_advances_within_year() {
        assert_eq!(
            next_period_name(Some("2º Bimestre 2024"), 2024),
            "3º Bimestre 2024"
        );
        assert_eq!(
            next_period_name(Some("1º Semestre 2024"), 2024),
            "2º Semestre 2024"
        );
    }

    #[test]
    fn next_period_rolls_over_to_next_year() {
        assert_eq!(
            next_period_name(Some("4º Bimestre 2024"), 2024),
            "1º Bimestre 2025"
        );
        assert_eq!(
            next_period_name(Some("3º Trimestre 2025"), 2025),
            "1º Trimestre 2026"
        );
        assert_eq!(
            next_period_name(Some("2º Semestre 2024"), 2024),
            "1º Semestre 2025"
        );
    }

    #[test]
    fn next_period_falls_back_on_custom_names() {
        assert_eq!(next_period_name(None, 2025), "1º Bimestre 2025");
        assert_eq!(
            next_period_name(Some("Período de adaptação"), 2025),
            "1º Bimestre 2025"
        );
        assert_eq!(
            next_period_name(Some("Avaliação 2ª Trimestre 2025 final"), 2025),
            "3º Trimestre 2025"
        );
    }
}
