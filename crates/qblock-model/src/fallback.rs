//! Deterministic board-position QUBO used whenever a request cannot be
//! compiled.
//!
//! The cells of a 3×3 board are weighted by classical tic-tac-toe strategy:
//! centre above corners above edges, with a uniform pairwise penalty so the
//! sampler prefers a single move.

use crate::qubo::Qubo;

/// Number of cells on the default board.
pub const DEFAULT_BOARD_SIZE: usize = 9;

const CENTER: usize = 4;
const CORNERS: [usize; 4] = [0, 2, 6, 8];

const CENTER_WEIGHT: f64 = 9.0;
const CORNER_WEIGHT: f64 = 7.0;
const EDGE_WEIGHT: f64 = 5.0;
const PAIR_WEIGHT: f64 = -4.0;
const OFFSET: f64 = 1.0;

/// Weight of a single cell.
pub fn cell_weight(index: usize) -> f64 {
    if index == CENTER {
        CENTER_WEIGHT
    } else if CORNERS.contains(&index) {
        CORNER_WEIGHT
    } else {
        EDGE_WEIGHT
    }
}

/// Build the fallback QUBO over labels `x0..x{board_size - 1}`.
pub fn create_fallback_qubo(board_size: usize) -> Qubo {
    let labels: Vec<String> = (0..board_size).map(|i| format!("x{i}")).collect();
    let mut qubo = Qubo::new(OFFSET);

    for (i, label) in labels.iter().enumerate() {
        qubo.add(label, label, cell_weight(i));
    }
    for i in 0..labels.len() {
        for j in i + 1..labels.len() {
            qubo.add(&labels[i], &labels[j], PAIR_WEIGHT);
        }
    }

    qubo
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_board() {
        let q = create_fallback_qubo(DEFAULT_BOARD_SIZE);

        assert_eq!(q.get("x4", "x4"), Some(9.0));
        for corner in ["x0", "x2", "x6", "x8"] {
            assert_eq!(q.get(corner, corner), Some(7.0));
        }
        for edge in ["x1", "x3", "x5", "x7"] {
            assert_eq!(q.get(edge, edge), Some(5.0));
        }
        assert_eq!(q.get("x0", "x8"), Some(-4.0));
        assert_eq!(q.offset(), 1.0);
        // 9 diagonal + 36 pairs
        assert_eq!(q.len(), 45);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(create_fallback_qubo(9), create_fallback_qubo(9));
    }

    #[test]
    fn test_small_board() {
        let q = create_fallback_qubo(2);
        assert_eq!(q.labels(), vec!["x0", "x1"]);
        assert_eq!(q.get("x0", "x1"), Some(-4.0));
        assert_eq!(q.get("x1", "x1"), Some(5.0));
    }
}
