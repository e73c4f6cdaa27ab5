//! Board Engine
//!
//! 6×7 盤面の純粋な計算（着手位置の解決、勝利判定、引き分け判定）。
//! 状態を持たず、入力の盤面を書き換えることはありません。
//!
//! Row 0 is the top of the board, row 5 the bottom. Discs fall towards row 5.

use serde::{Deserialize, Serialize};

use super::error::MoveError;

pub const BOARD_ROWS: usize = 6;
pub const BOARD_COLS: usize = 7;
pub const WINNING_COUNT: usize = 4;

const EMPTY_CELL: u8 = 0;

/// Scan directions in the order they are checked: horizontal, vertical,
/// diagonal ↘, diagonal ↗.
const AXES: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// 座席（1 = 先に入室したプレイヤー, 2 = 後から入室したプレイヤー）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Seat {
    One,
    Two,
}

impl Seat {
    /// 盤面上のセル値
    pub fn cell_value(self) -> u8 {
        match self {
            Seat::One => 1,
            Seat::Two => 2,
        }
    }
}

/// セル座標
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellPosition {
    pub row: usize,
    pub col: usize,
}

impl CellPosition {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// 6×7 の盤面（0 = 空, 1 / 2 = 座席番号）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board([[u8; BOARD_COLS]; BOARD_ROWS]);

impl Default for Board {
    fn default() -> Self {
        create_empty_board()
    }
}

impl Board {
    /// Build a board from raw rows. Returns `None` if any cell is not 0, 1 or 2.
    pub fn from_rows(rows: [[u8; BOARD_COLS]; BOARD_ROWS]) -> Option<Self> {
        rows.iter()
            .flatten()
            .all(|&cell| cell <= 2)
            .then_some(Self(rows))
    }

    pub fn rows(&self) -> &[[u8; BOARD_COLS]; BOARD_ROWS] {
        &self.0
    }

    /// # Panics
    ///
    /// Panics if `row` or `col` is outside the board.
    pub fn cell(&self, row: usize, col: usize) -> u8 {
        self.0[row][col]
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().flatten().all(|&cell| cell == EMPTY_CELL)
    }

    fn value_at(&self, row: isize, col: isize) -> Option<u8> {
        let row = usize::try_from(row).ok()?;
        let col = usize::try_from(col).ok()?;
        self.0.get(row)?.get(col).copied()
    }
}

/// `apply_move` の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedMove {
    pub board: Board,
    pub row: usize,
}

/// 空の盤面を作成
pub fn create_empty_board() -> Board {
    Board([[EMPTY_CELL; BOARD_COLS]; BOARD_ROWS])
}

/// Lowest empty row in `column`, or `None` if the column is outside the board
/// or already full.
pub fn find_available_row(board: &Board, column: usize) -> Option<usize> {
    if column >= BOARD_COLS || board.cell(0, column) != EMPTY_CELL {
        return None;
    }
    (0..BOARD_ROWS)
        .rev()
        .find(|&row| board.cell(row, column) == EMPTY_CELL)
}

/// Drop a disc for `seat` into `column`, returning a new board.
pub fn apply_move(board: &Board, column: usize, seat: Seat) -> Result<AppliedMove, MoveError> {
    if column >= BOARD_COLS {
        return Err(MoveError::InvalidColumn);
    }
    let row = find_available_row(board, column).ok_or(MoveError::ColumnFull)?;

    let mut next = *board;
    next.0[row][column] = seat.cell_value();

    Ok(AppliedMove { board: next, row })
}

/// Check whether the disc at (`row`, `col`) completes four in a row for `seat`.
///
/// Returns the contributing cells (at most four) of the first winning axis.
pub fn check_win(board: &Board, row: usize, col: usize, seat: Seat) -> Option<Vec<CellPosition>> {
    AXES.iter()
        .map(|&axis| run_along_axis(board, row, col, axis, seat.cell_value()))
        .find(|cells| cells.len() >= WINNING_COUNT)
}

fn run_along_axis(
    board: &Board,
    row: usize,
    col: usize,
    (dr, dc): (isize, isize),
    value: u8,
) -> Vec<CellPosition> {
    let mut cells = Vec::with_capacity(WINNING_COUNT);

    // positive direction, origin included
    let (mut r, mut c) = (row as isize, col as isize);
    while cells.len() < WINNING_COUNT && board.value_at(r, c) == Some(value) {
        cells.push(CellPosition::new(r as usize, c as usize));
        r += dr;
        c += dc;
    }

    // negative direction, origin excluded
    let (mut r, mut c) = (row as isize - dr, col as isize - dc);
    while cells.len() < WINNING_COUNT && board.value_at(r, c) == Some(value) {
        cells.push(CellPosition::new(r as usize, c as usize));
        r -= dr;
        c -= dc;
    }

    cells
}

/// The game is drawn once every column is full, i.e. the top row is occupied.
pub fn check_draw(board: &Board) -> bool {
    board.rows()[0].iter().all(|&cell| cell != EMPTY_CELL)
}
