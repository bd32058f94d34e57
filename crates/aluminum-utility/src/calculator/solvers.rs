//! Percentage, quadratic and descriptive statistics helpers

use serde::Serialize;

use crate::error::UtilityError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentageBreakdown {
    pub percentage_amount: f64,
    pub total_with_percentage: f64,
    pub total_less_percentage: f64,
    /// `None` when the base value is zero
    pub is_what_percent_of: Option<f64>,
}

pub fn percentage(value: f64, pct: f64) -> PercentageBreakdown {
    let amount = value * pct / 100.0;
    PercentageBreakdown {
        percentage_amount: amount,
        total_with_percentage: value + amount,
        total_less_percentage: value - amount,
        is_what_percent_of: (value != 0.0).then(|| pct / value * 100.0),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RootNature {
    RealDistinct,
    RealEqual,
    Complex,
}

impl RootNature {
    pub fn as_str(&self) -> &'static str {
        match self {
            RootNature::RealDistinct => "Real and distinct",
            RootNature::RealEqual => "Real and equal",
            RootNature::Complex => "Complex",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuadraticSolution {
    pub discriminant: f64,
    pub nature: RootNature,
    pub roots: [Complex; 2],
}

/// Solve `a*x^2 + b*x + c = 0`
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> Result<QuadraticSolution> {
    if a == 0.0 {
        return Err(UtilityError::NotQuadratic);
    }

    let discriminant = b * b - 4.0 * a * c;
    let nature = if discriminant > 0.0 {
        RootNature::RealDistinct
    } else if discriminant == 0.0 {
        RootNature::RealEqual
    } else {
        RootNature::Complex
    };

    let roots = if discriminant >= 0.0 {
        let sqrt = discriminant.sqrt();
        [
            Complex {
                re: (-b + sqrt) / (2.0 * a),
                im: 0.0,
            },
            Complex {
                re: (-b - sqrt) / (2.0 * a),
                im: 0.0,
            },
        ]
    } else {
        let re = -b / (2.0 * a);
        let im = discriminant.abs().sqrt() / (2.0 * a);
        [Complex { re, im }, Complex { re, im: -im }]
    };

    Ok(QuadraticSolution {
        discriminant,
        nature,
        roots,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub count: usize,
    pub sum: f64,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub mode: Option<f64>,
    pub range: Option<f64>,
    /// Population variance
    pub variance: Option<f64>,
    pub std_dev: Option<f64>,
}

pub fn statistics(data: &[f64]) -> Statistics {
    let count = data.len();
    let sum: f64 = data.iter().sum();
    if count == 0 {
        return Statistics {
            count,
            sum,
            mean: None,
            median: None,
            mode: None,
            range: None,
            variance: None,
            std_dev: None,
        };
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mean = sum / count as f64;
    let median = if count % 2 == 0 {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    } else {
        sorted[count / 2]
    };
    let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count as f64;

    Statistics {
        count,
        sum,
        mean: Some(mean),
        median: Some(median),
        mode: mode(&sorted),
        range: Some(sorted[count - 1] - sorted[0]),
        variance: Some(variance),
        std_dev: Some(variance.sqrt()),
    }
}

/// Most frequent value of sorted data; ties go to the smallest value
fn mode(sorted: &[f64]) -> Option<f64> {
    let mut best: Option<(f64, usize)> = None;
    for run in sorted.chunk_by(|a, b| a == b) {
        if best.map_or(true, |(_, n)| run.len() > n) {
            best = Some((run[0], run.len()));
        }
    }
    best.map(|(value, _)| value)
}
