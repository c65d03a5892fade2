use serde::Serialize;

/// Nutrient profile normalized to 100 g, as stored on a food row.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NutrientsPer100g {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub sodium_mg: f64,
}

/// Nutrients scaled to an actual logged quantity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PortionNutrition {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub sodium_mg: f64,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl NutrientsPer100g {
    /// Calories round to the nearest whole kcal and everything else to two
    /// decimals here, per portion. Daily totals are sums of already-rounded
    /// portions; keep that order or stored summaries stop being reproducible.
    pub fn portion(&self, quantity_grams: f64) -> PortionNutrition {
        let m = quantity_grams / 100.0;
        PortionNutrition {
            calories: (self.calories * m).round(),
            protein: round2(self.protein * m),
            carbs: round2(self.carbs * m),
            fats: round2(self.fats * m),
            fiber: round2(self.fiber * m),
            sugar: round2(self.sugar * m),
            sodium_mg: round2(self.sodium_mg * m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_to_quantity() {
        let per_100g = NutrientsPer100g {
            calories: 200.0,
            protein: 10.0,
            carbs: 30.0,
            fats: 5.0,
            fiber: 2.0,
            sugar: 1.0,
            sodium_mg: 40.0,
        };
        let portion = per_100g.portion(150.0);
        assert_eq!(portion.calories, 300.0);
        assert_eq!(portion.protein, 15.0);
        assert_eq!(portion.carbs, 45.0);
        assert_eq!(portion.fats, 7.5);
    }

    #[test]
    fn calories_round_to_whole_kcal() {
        let per_100g = NutrientsPer100g {
            calories: 89.0,
            ..Default::default()
        };
        // 89 * 0.33 = 29.37 -> 29
        assert_eq!(per_100g.portion(33.0).calories, 29.0);
    }

    #[test]
    fn macros_round_to_two_decimals() {
        let per_100g = NutrientsPer100g {
            protein: 3.333,
            ..Default::default()
        };
        // 3.333 * 0.33 = 1.09989 -> 1.1
        assert_eq!(per_100g.portion(33.0).protein, 1.1);
    }

    #[test]
    fn zero_quantity_is_zero() {
        let per_100g = NutrientsPer100g {
            calories: 500.0,
            protein: 20.0,
            ..Default::default()
        };
        assert_eq!(per_100g.portion(0.0), PortionNutrition::default());
    }
}
