// location-bingo/src/defs.rs
// Fixed geometry and labels of the bingo card.

use std::time::Duration;

pub struct GridStruct {
    pub rows: usize,
    pub cols: usize,
    pub free_cell: usize,
}

pub const GRIDCONFIG: GridStruct = GridStruct {
    rows: 5,      // rows in the card
    cols: 5,      // columns in the card
    free_cell: 12, // center cell, always visited
};

pub const CELLCOUNT: usize = GRIDCONFIG.rows * GRIDCONFIG.cols;
pub const FREE_CELL: usize = GRIDCONFIG.free_cell;
pub const LINECOUNT: usize = GRIDCONFIG.rows + GRIDCONFIG.cols + 2;

// Spot labels in row-major order.
pub const SPOTS: [&str; CELLCOUNT] = [
    "渋谷駅",
    "原宿駅",
    "表参道",
    "代々木公園",
    "明治神宮",
    "新宿御苑",
    "東京タワー",
    "六本木",
    "浅草寺",
    "上野公園",
    "秋葉原",
    "スカイツリー",
    "築地市場",
    "豊洲",
    "お台場",
    "銀座",
    "日本橋",
    "皇居",
    "東京駅",
    "品川駅",
    "池袋",
    "中野",
    "吉祥寺",
    "下北沢",
    "自由が丘",
];

pub const STATE_PARAM: &str = "state";
pub const COUPON_PARAM: &str = "coupon";

pub const QR_ENDPOINT: &str = "https://api.qrserver.com/v1/create-qr-code/";
pub const QR_SIZE: &str = "300x300";

pub const CELEBRATION_DURATION: Duration = Duration::from_secs(3);

pub const RESET_PROMPT: &str = "ゲームをリセットしますか?";
