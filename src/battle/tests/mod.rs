pub mod common;





#[cfg(test)]
mod test_residual_damage;

#[cfg(test)]
mod test_sleep_freeze;


#[cfg(test)]
mod test_choice_validation;
