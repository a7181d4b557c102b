use crate::pb::{SumRequest, SumResponse};

/// Adds the two operands. NaN and infinities propagate like any other `f64`.
pub fn sum(request: SumRequest) -> SumResponse {
    SumResponse {
        sum: request.num1 + request.num2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(num1: f64, num2: f64) -> f64 {
        sum(SumRequest { num1, num2 }).sum
    }

    #[test]
    fn adds_fractional_and_negative_operands() {
        assert_eq!(add(5.5, 7.4), 5.5 + 7.4);
        assert_eq!(add(-3.25, 1.0), -2.25);
        assert_eq!(add(0.1, 0.2), 0.1 + 0.2);
    }

    #[test]
    fn non_finite_values_propagate() {
        assert!(add(f64::NAN, 1.0).is_nan());
        assert_eq!(add(f64::MAX, f64::MAX), f64::INFINITY);
    }

    #[test]
    fn identical_inputs_give_identical_outputs() {
        let request = SumRequest {
            num1: 1.5,
            num2: -0.75,
        };
        assert_eq!(sum(request), sum(request));
    }
}
