pub mod google;
pub mod naver;
