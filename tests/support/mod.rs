#![allow(dead_code)]

pub mod bookings;
