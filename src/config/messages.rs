//! Fixed user-facing strings.

pub const NETWORK_ERROR: &str =
    "Network connection failed. Please check your internet connection.";
pub const AUTH_FAILED: &str = "Authentication failed. Please check your credentials.";
pub const GENERIC_ERROR: &str = "An unexpected error occurred. Please try again.";
pub const INVALID_RESPONSE: &str = "Invalid response from server";
pub const REGISTRATION_SUCCESS: &str = "Registration successful! Welcome to Tekken Arena!";
pub const LOGIN_SUCCESS: &str = "Login successful! Welcome back!";
pub const LOGOUT_SUCCESS: &str = "Logged out successfully";
pub const PASSWORDS_MISMATCH: &str = "Passwords do not match";
pub const INVALID_EMAIL: &str = "Please enter a valid email address";
pub const FAVORITES_UPDATE_FAILED: &str = "Failed to update favorites";
pub const FIGHTERS_LOAD_FAILED: &str = "Failed to load fighters";

pub const ADD_TO_FAVORITES: &str = "ADD TO FAVORITES";
pub const REMOVE_FROM_FAVORITES: &str = "REMOVE FROM FAVORITES";
pub const FAVORITE_UPDATING: &str = "Updating...";
pub const FAVORITE_UPDATED: &str = "Updated!";
