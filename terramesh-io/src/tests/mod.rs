//! Binary format tests
