//! 内存层模块测试

#[allow(unused_imports)]
pub mod integration;
