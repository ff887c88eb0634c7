pub mod badges;
pub mod burns;
